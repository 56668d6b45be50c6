// src/main.rs

use std::io;
use std::sync::RwLock;

use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdvmarket::assistente::gemini::ClienteGemini;
use pdvmarket::config::Config;
use pdvmarket::vendas::carrinho::Sacolas;
use pdvmarket::{configurar_rotas, AppState};

fn iniciar_logs() {
    // PDV_LOG_FORMAT=json gera uma linha JSON por evento
    let formato = std::env::var("PDV_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filtro = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pdvmarket=info,actix_web=info".into());

    match formato.as_str() {
        "json" => tracing_subscriber::registry()
            .with(filtro)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        _ => tracing_subscriber::registry()
            .with(filtro)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

// Função principal da aplicação Actix Web.
#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();
    iniciar_logs();

    let config = Config::from_env().map_err(|e| {
        tracing::error!(erro = %e, "Configuração inválida");
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // A coluna 'preco' e os demais valores são NUMERIC, lidos como BigDecimal
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            tracing::error!(erro = %e, "Falha ao conectar ao banco PostgreSQL");
            io::Error::new(io::ErrorKind::ConnectionRefused, e.to_string())
        })?;

    sqlx::migrate!("./migrations").run(&db_pool).await.map_err(|e| {
        tracing::error!(erro = %e, "Falha ao aplicar as migrações");
        io::Error::new(io::ErrorKind::Other, e.to_string())
    })?;

    let assistente = match &config.gemini_api_key {
        Some(chave) => Some(ClienteGemini::new(chave.clone(), config.gemini_modelo.clone())),
        None => {
            tracing::warn!("GEMINI_API_KEY não configurada; o assistente usará respostas de demonstração");
            None
        }
    };

    let app_state = web::Data::new(AppState {
        db_pool,
        jwt_secret: config.jwt_secret.clone(),
        jwt_expiracao_horas: config.jwt_expiracao_horas,
        limite_estoque_baixo: config.limite_estoque_baixo,
        assistente,
    });

    // Sacolas em memória, uma por operador. RwLock permite múltiplos leitores ou um único escritor.
    let sacolas = web::Data::new(RwLock::new(Sacolas::default()));

    tracing::info!(endereco = %config.bind_addr, "Iniciando API PDVMarket");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .app_data(sacolas.clone())
            .configure(configurar_rotas)
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
