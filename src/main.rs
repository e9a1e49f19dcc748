use anyhow::Result;
use clap::Parser;
use taxiload::ingest::{self, IngestConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// Ingest NYC taxi data into PostgreSQL.
#[derive(Parser, Debug)]
#[command(about = "Ingest NYC taxi data into PostgreSQL")]
struct Args {
    /// PostgreSQL user
    #[arg(long, default_value = "root")]
    pg_user: String,

    /// PostgreSQL password
    #[arg(long, default_value = "root")]
    pg_pass: String,

    /// PostgreSQL host
    #[arg(long, default_value = "pgdatabase")]
    pg_host: String,

    /// PostgreSQL port
    #[arg(long, default_value_t = 5432)]
    pg_port: u16,

    /// PostgreSQL database name
    #[arg(long, default_value = "ny_taxi")]
    pg_db: String,

    /// Target table name
    #[arg(long, default_value = "green_trip_data")]
    target_table: String,

    /// Rows per database write
    #[arg(long, default_value_t = 100_000, value_parser = clap::value_parser!(u64).range(1..))]
    chunksize: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();
    ingest::run(IngestConfig {
        pg_user: args.pg_user,
        pg_pass: args.pg_pass,
        pg_host: args.pg_host,
        pg_port: args.pg_port,
        pg_db: args.pg_db,
        target_table: args.target_table,
        chunksize: args.chunksize as usize,
    })
    .await
}
