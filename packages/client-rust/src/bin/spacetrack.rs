//! `spacetrack`: run one catalog query from the command line.
//!
//! ```text
//! spacetrack --where NORAD_CAT_ID:eq:25544 \
//!            --where EPOCH:range:2010-01-01,2010-12-01 \
//!            --output ISS_data
//! ```

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use spacetrack_client::{
    ClientConfig, CredentialSource, Credentials, FileCredentials, Persistence, SpaceTrackClient,
    SpaceTrackQuery, StaticCredentials,
};
use spacetrack_core::{Constraint, Dataset, Field, QueryRequest, SortOrder};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "spacetrack")]
#[command(about = "Query the Space-Track catalog and save the result as JSON")]
#[command(version)]
struct Cli {
    /// Filter as FIELD:OPERATOR:VALUE[,VALUE...], e.g. EPOCH:range:2010-01-01,2010-12-01.
    /// Repeatable; order is preserved in the request.
    #[arg(long = "where", value_name = "CONSTRAINT")]
    constraints: Vec<Constraint>,

    /// Catalog class: gp (latest) or gp_history. Other names fall back to gp_history.
    #[arg(long, default_value = "gp_history")]
    dataset: Dataset,

    #[arg(long, default_value = "EPOCH")]
    order_by: Field,

    /// Sort descending instead of ascending.
    #[arg(long)]
    desc: bool,

    /// Maximum number of records.
    #[arg(long)]
    limit: Option<u32>,

    /// Output file; any extension is replaced with .json.
    #[arg(long, short, default_value = "spacetrack_data.json")]
    output: String,

    /// Do not write the output file.
    #[arg(long)]
    no_save: bool,

    /// Print the retrieved document to stdout.
    #[arg(long)]
    print: bool,

    /// TOML file with a [configuration] section holding username and password.
    #[arg(long, env = "SPACETRACK_CREDENTIALS", default_value = "STCredentials.toml")]
    credentials: String,

    #[arg(long, env = "SPACETRACK_USERNAME", requires = "password")]
    username: Option<String>,

    #[arg(long, env = "SPACETRACK_PASSWORD", hide_env_values = true, requires = "username")]
    password: Option<String>,

    #[arg(long, env = "SPACETRACK_BASE_URL", default_value = spacetrack_client::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn request(&self) -> QueryRequest {
        let mut request = QueryRequest::new(self.dataset, self.output.clone())
            .constraints(self.constraints.iter().cloned())
            .order_by(self.order_by, SortOrder::from_ascending(!self.desc))
            .save_data(!self.no_save);
        if let Some(limit) = self.limit {
            request = request.limit(limit);
        }
        request
    }

    fn client(&self) -> SpaceTrackClient {
        SpaceTrackClient::new(ClientConfig {
            base_url: self.base_url.clone(),
            request_timeout: Duration::from_secs(self.timeout_secs),
            ..ClientConfig::default()
        })
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run<C: CredentialSource>(cli: &Cli, credentials: C) -> anyhow::Result<()> {
    let query = SpaceTrackQuery::new(cli.client(), credentials);
    let outcome = query.run(&cli.request()).await?;

    info!(records = outcome.record_count(), "query complete");
    if cli.print {
        let text = serde_json::to_string_pretty(&outcome.document)
            .context("cannot render result document")?;
        println!("{text}");
    }

    match outcome.persistence {
        Persistence::Written(path) => {
            info!(path = %path.display(), "saved");
            Ok(())
        }
        Persistence::Skipped => Ok(()),
        Persistence::Failed(e) => Err(e).context("query succeeded but the result was not saved"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let result = match (&cli.username, &cli.password) {
        (Some(username), Some(password)) => {
            let source = StaticCredentials(Credentials::new(username, password));
            run(&cli, source).await
        }
        _ => run(&cli, FileCredentials::new(&cli.credentials)).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
