// --- simgn: ETL de gas natural - binario principal ---

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};

use simgn::error::append_error_log;
use simgn::store::{filter_options, open_fact_connection, table_stats};
use simgn::{run_pipeline, EtlConfig, FactTable, MirrorFetcher, PipelineOptions};

#[derive(Parser, Debug)]
#[command(name = "simgn", about = "Carga regalías, producción y demanda de gas natural a tablas de hechos")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Corre el ETL completo (o una sola tabla con --only)
    Run {
        /// Raíz del espejo local de las fuentes
        #[arg(long)]
        mirror: Option<PathBuf>,
        /// URL del almacén (sqlite://, file://, postgres://)
        #[arg(long)]
        db: Option<String>,
        /// Archivos de producción a procesar (0 = todos)
        #[arg(long)]
        file_limit: Option<usize>,
        /// Hojas por libro de producción
        #[arg(long)]
        sheet_limit: Option<usize>,
        /// royalties | production | demand
        #[arg(long, value_parser = parse_table)]
        only: Option<FactTable>,
        /// Escribe el reporte de la corrida en JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Opciones de filtro de una tabla
    Filters {
        #[arg(value_parser = parse_table)]
        table: FactTable,
    },
    /// Conteo y total de una tabla
    Stats {
        #[arg(value_parser = parse_table)]
        table: FactTable,
    },
}

fn parse_table(s: &str) -> Result<FactTable, String> {
    FactTable::parse(s).ok_or_else(|| format!("unknown table '{}' (royalties, production, demand)", s))
}

fn run(cli: Cli, config: &mut EtlConfig) -> simgn::Result<()> {
    match cli.command {
        Command::Run { mirror, db, file_limit, sheet_limit, only, report } => {
            if let Some(m) = mirror {
                config.mirror_dir = m;
            }
            if db.is_some() {
                config.db_url = db;
            }
            if let Some(n) = file_limit {
                config.production_file_limit = n;
            }
            if let Some(n) = sheet_limit {
                config.production_sheet_limit = n;
            }

            let mut conn = open_fact_connection(config)?;
            conn.init_schema()?;
            let fetcher = MirrorFetcher::new(&config.mirror_dir);
            info!("fuentes desde el espejo {}", fetcher.root().display());
            let mut options = PipelineOptions::from_config(config);
            options.only = only;

            let run_report = run_pipeline(&fetcher, &mut conn, &options)?;
            info!("corrida terminada: {} registros cargados", run_report.total_loaded());
            if let Some(path) = report {
                std::fs::write(&path, serde_json::to_string_pretty(&run_report)?)?;
                info!("reporte escrito en {}", path.display());
            }
        }
        Command::Filters { table } => {
            let mut conn = open_fact_connection(config)?;
            conn.init_schema()?;
            let options = filter_options(&mut conn, table)?;
            println!("{}", serde_json::to_string_pretty(&options)?);
        }
        Command::Stats { table } => {
            let mut conn = open_fact_connection(config)?;
            conn.init_schema()?;
            let stats = table_stats(&mut conn, table)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let mut config = match EtlConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli, &mut config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            if let Err(io) = append_error_log(&config.error_log, &e) {
                error!("no se pudo escribir {}: {}", config.error_log.display(), io);
            } else {
                error!("detalle en {}", config.error_log.display());
            }
            ExitCode::FAILURE
        }
    }
}
