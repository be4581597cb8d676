use std::sync::Arc;

use anyhow::Result;
use climahealth_core::{AppError, Config, ConfigError, StorageBackend};
use climahealth_health::{Analysis, RiskLevel};
use climahealth_services::{
    Advisor, AdvisorError, Advisory, MemoryStore, SharedStore, SnapshotSource, SqliteKvStore,
};
use climahealth_weather::{Location, WeatherCache, WeatherProvider};

#[tokio::main]
async fn main() -> Result<()> {
    climahealth_core::init()?;

    let config = match Config::load_validated() {
        Ok((config, _)) => config,
        Err(e) => match e.downcast::<ConfigError>() {
            Ok(config_err) => {
                let err = AppError::from(config_err);
                tracing::error!("{}", err);
                eprintln!("{}", err.user_message());
                return Ok(());
            }
            Err(other) => return Err(other),
        },
    };

    let kv: SharedStore = match config.storage.backend {
        StorageBackend::Sqlite => Arc::new(SqliteKvStore::open(config.database_path())?),
        StorageBackend::Memory => MemoryStore::shared(),
    };

    let provider = WeatherProvider::new(
        config.weather.base_url.clone(),
        config.weather.resolved_api_key(),
    )?;
    let advisor = Advisor::from_config(provider, kv, &config)
        .with_cache(WeatherCache::open(&config.data_dir));

    let home = config.weather.default_location;
    let location = Location::new(home.latitude, home.longitude);

    tracing::info!("ClimaHealth started");
    println!("ClimaHealth - Clima e Saúde");

    match advisor.check_primary(&location).await {
        Ok(advisory) => print_advisory("Seu perfil", &advisory),
        Err(AdvisorError::NoProfile) => {
            println!("Nenhum perfil de saúde cadastrado. Crie um perfil para receber alertas.");
            return Ok(());
        }
        Err(e) => {
            let err = AppError::from(e);
            tracing::error!("Advisory cycle failed: {}", err);
            eprintln!("{}", err.user_message());
            return Ok(());
        }
    }

    match advisor.check_family(&location).await {
        Ok(advisories) => {
            for advisory in &advisories {
                print_advisory(&format!("Familiar {}", advisory.profile_id), advisory);
            }
        }
        Err(e) => {
            let err = AppError::from(e);
            tracing::warn!("Family check failed: {}", err);
            eprintln!("{}", err.user_message());
        }
    }

    Ok(())
}

fn print_advisory(title: &str, advisory: &Advisory) {
    println!("\n{}", title);

    match (&advisory.snapshot, advisory.source) {
        (Some(s), source) => {
            let origin = if source == SnapshotSource::Cached {
                " (cache)"
            } else {
                ""
            };
            println!(
                "  Clima{}: {:.1}°C, umidade {}%, UV {:.1} ({}), ar {}",
                origin,
                s.temperature,
                s.humidity,
                s.uv_index,
                s.uv_level().label(),
                s.air_quality().map(|a| a.label()).unwrap_or("desconhecido")
            );
        }
        (None, _) => println!("  Dados do clima indisponíveis no momento."),
    }
    if let Some(notice) = advisory.notice {
        println!("  Aviso: {}", notice);
    }

    print_analysis(&advisory.analysis);
}

fn print_analysis(analysis: &Analysis) {
    if !analysis.has_risks() {
        println!("  Nenhum risco identificado.");
        return;
    }

    for risk in &analysis.risks {
        println!("  [{}] {}", level_label(risk.level), risk.message);
    }
    println!("  Recomendações:");
    for rec in &analysis.recommendations {
        println!("    - {}", rec);
    }
}

fn level_label(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "baixo",
        RiskLevel::Medium => "médio",
        RiskLevel::High => "alto",
    }
}
