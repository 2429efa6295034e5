use crate::DAI;
use axum::{
    Json, Router,
    extract::Path,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use srcfetch::{ChainId, FetchError, SourceApiClient, SourceProvider};

/// Serves `router` on an ephemeral local port and returns its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}")
}

async fn srcapi(
    Path((chain, address)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) != Some("application/json") {
        return StatusCode::NOT_ACCEPTABLE.into_response();
    }
    let standard_json = json!({
        "language": "Solidity",
        "sources": {
            "src/Dai.sol": {"content": format!("// chain {chain}\ncontract Dai {{}}")},
            "lib/ds/auth.sol": {"content": "contract DSAuth {}"}
        },
        "settings": {"remappings": ["ds/=lib/ds/"]}
    });
    match address.as_str() {
        DAI => Json(json!({
            "result": standard_json.to_string(),
            "contractName": "Dai",
            "ext": "sol"
        }))
        .into_response(),
        "0x0000000000000000000000000000000000000001" => Json(json!({
            "result": "contract Proxy {}",
            "contractName": "Proxy",
            "ext": "sol",
            "proxyAddress": DAI,
            "proxyResult": "# @version 0.3.10\n",
            "proxyContractName": "Vault",
            "proxyExt": "vy"
        }))
        .into_response(),
        "0x0000000000000000000000000000000000000002" => Json(json!({ "result": "" })).into_response(),
        "0x0000000000000000000000000000000000000003" => {
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        "0x0000000000000000000000000000000000000004" => "<html>rate limited</html>".into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Starts a fake source lookup service and returns its base URL.
pub async fn serve_srcapi() -> String {
    serve(Router::new().route("/srcapi/{chain}/{address}", get(srcapi))).await
}

async fn client() -> SourceApiClient {
    SourceApiClient::new(serve_srcapi().await).unwrap()
}

#[tokio::test]
async fn fetches_standard_json() {
    let client = client().await;
    let bundle = client.fetch(DAI, &ChainId::Id(1)).await.unwrap();
    assert_eq!(bundle.contract_name.as_deref(), Some("Dai"));
    assert_eq!(bundle.files.len(), 2);
    assert_eq!(bundle.files["src/Dai.sol"], "// chain 1\ncontract Dai {}");
    assert_eq!(bundle.remappings_txt().as_deref(), Some("ds/=lib/ds/"));
}

#[tokio::test]
async fn passes_chain_names_through() {
    let client = client().await;
    let bundle = client.fetch(DAI, &ChainId::Named("ethereum".into())).await.unwrap();
    assert!(bundle.files["src/Dai.sol"].starts_with("// chain ethereum\n"));
}

#[tokio::test]
async fn follows_proxy() {
    let client = client().await;
    let bundle =
        client.fetch("0x0000000000000000000000000000000000000001", &ChainId::Id(1)).await.unwrap();
    assert_eq!(bundle.contract_name.as_deref(), Some("Vault"));
    assert_eq!(bundle.files.keys().map(String::as_str).collect::<Vec<_>>(), ["Vault.vy"]);
}

#[tokio::test]
async fn empty_result_is_not_found() {
    let client = client().await;
    let err =
        client.fetch("0x0000000000000000000000000000000000000002", &ChainId::Id(1)).await.unwrap_err();
    assert!(matches!(err, FetchError::NotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn http_404_is_not_found() {
    let client = client().await;
    let err =
        client.fetch("0x00000000000000000000000000000000000000ff", &ChainId::Id(1)).await.unwrap_err();
    assert!(matches!(err, FetchError::NotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn server_error_is_reported() {
    let client = client().await;
    let err =
        client.fetch("0x0000000000000000000000000000000000000003", &ChainId::Id(1)).await.unwrap_err();
    match err {
        FetchError::Status { status, url, .. } => {
            assert_eq!(status.as_u16(), 500);
            assert!(url.ends_with("/srcapi/1/0x0000000000000000000000000000000000000003"), "{url}");
        }
        err => panic!("unexpected error: {err:?}"),
    }
}

#[tokio::test]
async fn non_json_body_is_a_decode_error() {
    let client = client().await;
    let err =
        client.fetch("0x0000000000000000000000000000000000000004", &ChainId::Id(1)).await.unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)), "{err:?}");
}
