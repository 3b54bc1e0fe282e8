use crate::models::{BalanceSummary, CardsPage, CreateCardBody, ErrorBody, TopupBody, TransferBody};
use utoipa::OpenApi;

/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Wallet Gateway",
        description = "Action-multiplexed proxy in front of the ledger provider"
    ),
    paths(crate::handlers::health, crate::handlers::gateway),
    components(schemas(
        TopupBody,
        TransferBody,
        CreateCardBody,
        BalanceSummary,
        CardsPage,
        ErrorBody
    )),
    tags(
        (name = "gateway", description = "Ledger actions"),
        (name = "service", description = "Liveness")
    )
)]
pub struct ApiDoc;
