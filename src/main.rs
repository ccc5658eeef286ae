use anyhow::Context;
use clap::Parser;
use label_validator::{cli, codec, config, interactive, session};
use cli::{Cli, Commands};
use config::Config;
use label_validator_common::{Command, Outcome};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load().context("no se pudo leer la configuración")?;

    match cli.command {
        Commands::Import { file } => {
            println!("📥 label-validator - importar\n");
            let mut session = session::open(&config, false)?;
            let count = session::import_file(&mut session, &codec::CalamineCodec, &file)
                .await
                .with_context(|| format!("importando {}", file.display()))?;
            println!("\n✔ {} etiquetas importadas", count);
        }

        Commands::Export { output } => {
            let mut session = session::open(&config, false)?;
            let dir = output.unwrap_or_else(|| config.export_dir());
            let path = session::export_to_dir(&mut session, &dir)?;
            println!("✔ Exportado: {}", path.display());
        }

        Commands::Browse => {
            let mut session = session::open(&config, false)?;
            interactive::run_browse(&mut session, &config).await?;
        }

        Commands::Scan { codes, validate } => {
            let mut session = session::open(&config, false)?;
            if codes.is_empty() {
                interactive::run_scan(&mut session, &config, validate).await?;
            } else {
                for code in &codes {
                    interactive::scan_code(&mut session, code, validate)?;
                }
                session.dispatch(Command::CloseSearch)?;
            }
        }

        Commands::Toggle { code } => {
            let mut session = session::open(&config, false)?;
            match session.dispatch(Command::Toggle(code.clone()))? {
                Outcome::Toggled { validated: true, .. } => println!("✔ {} validada", code),
                Outcome::Toggled { validated: false, .. } => println!("✔ {} sin validar", code),
                _ => eprintln!("✖ Etiqueta no encontrada: {}", code),
            }
        }

        Commands::Enter { value } => {
            let mut session = session::open(&config, false)?;
            session::enter_value(&mut session, &value)?;
        }

        Commands::Back => {
            let mut session = session::open(&config, false)?;
            if session.dispatch(Command::Back)? == Outcome::Unchanged {
                println!("Ya estás en el nivel de rutas");
            }
        }

        Commands::Status => {
            // 復元時の一覧とフッター、またはウェルカム画面を表示
            session::open(&config, true)?;
        }

        Commands::Clear { yes } => {
            let mut session = session::open(&config, false)?;
            interactive::run_clear(&mut session, yes)?;
        }

        Commands::Exit { yes, output } => {
            let mut session = session::open(&config, false)?;
            let dir = output.unwrap_or_else(|| config.export_dir());
            if interactive::run_exit(&mut session, &dir, yes)? {
                println!("👋 Hasta luego");
            }
        }

        Commands::Config { set_storage_dir, set_export_dir, show } => {
            let mut config = config;

            if let Some(dir) = set_storage_dir {
                config.set_storage_dir(dir)?;
                println!("✔ Directorio de guardado configurado");
            }

            if let Some(dir) = set_export_dir {
                config.set_export_dir(dir)?;
                println!("✔ Directorio de exportación configurado");
            }

            if show {
                println!("Configuración:");
                match config.storage_dir() {
                    Ok(dir) => println!("  Guardado: {}", dir.display()),
                    Err(e) => println!("  Guardado: {}", e),
                }
                println!("  Exportación: {}", config.export_dir().display());
                println!("  Envío automático: {} caracteres", config.auto_submit_length);
                println!("  Espera: {} ms", config.debounce_ms);
            }
        }
    }

    Ok(())
}
