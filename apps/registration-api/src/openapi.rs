use utoipa::OpenApi;

// The derive macro rejects an empty path literal in nest(...), but an
// expression evaluating to "" is accepted and keeps the nested paths unprefixed.
const ROOT_PATH: &str = "";

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Registration API",
        version = "0.1.0",
        description = "User registration service: list registered users and sign up new ones"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = ROOT_PATH, api = domain_users::ApiDoc)
    )
)]
pub struct ApiDoc;
