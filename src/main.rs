// src/main.rs

use anyhow::Context;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::EnvFilter;

use pos_backend::{
    config::{AppState, Config},
    router::build_router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env é opcional: em produção as variáveis vêm do ambiente
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let bind_addr = config.bind_addr;
    let admin_seed = config.admin_seed.clone();

    let app_state = AppState::new(config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    if let Some(seed) = admin_seed {
        app_state
            .auth_service
            .seed_admin(&seed.username, &seed.email, &seed.password)
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao criar o administrador inicial: {}", e))?;
    }

    let app = build_router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Falha ao escutar em {}", bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Erro no servidor Axum")?;

    tracing::info!("Servidor encerrado");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Falha ao instalar o handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Falha ao instalar o handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
