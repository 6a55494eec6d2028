use axum::Router;
use roost_core::config::Configuration;
use roost_core::error::{RoostError, RoostResult};
use roost_core::state::RoostState;

use crate::pages;

pub fn setup_all_routes(router: Router<RoostState>) -> Router<RoostState> {
    let router = pages::session::session_pages(router);
    let router = pages::dashboard::dashboard_pages(router);
    let router = pages::properties::property_pages(router);
    let router = pages::leases::lease_pages(router);
    let router = pages::maintenance::maintenance_pages(router);
    let router = pages::payments::payment_pages(router);
    let router = pages::messages::message_pages(router);

    router
}

pub async fn axum_setup(config: &Configuration) -> RoostResult<Router> {
    debug!("Configuring application server");
    let state = RoostState::new(config.clone()).await?;

    let router = Router::new();
    let router = setup_all_routes(router);
    let router = router.fallback(pages::not_found_page);

    Ok(router.with_state(state))
}

pub async fn server_start() -> RoostResult<()> {
    let config = Configuration::from_env()?;
    info!("Starting with config {:?}", config);

    let router = axum_setup(&config).await?;

    info!("Listening on http://{}", config.listen_on);
    axum::Server::bind(&config.listen_on)
        .serve(router.into_make_service())
        .await
        .map_err(|e| RoostError::Internal(e.into()))?;
    Ok(())
}
