//! Integration tests for the storefront API client.
//!
//! Run with: cargo test -p rocketshoes-integration-tests --test api_client

use std::time::Duration;

use secrecy::SecretString;
use testresult::TestResult;

use rocketshoes_cart::{ApiClient, ApiError, ProductLookup, StockLookup};
use rocketshoes_core::{Price, ProductId};
use rocketshoes_integration_tests::StubApi;

// ============================================================================
// Stock
// ============================================================================

#[tokio::test]
async fn test_fetches_stock() -> TestResult {
    let stub = StubApi::start().await?;
    stub.set_stock(1, 3);

    let client = ApiClient::new(&stub.api_config())?;
    let stock = client.stock(ProductId::new(1)).await?;

    assert_eq!(stock.amount, 3);
    assert_eq!(stock.id, Some(ProductId::new(1)));
    Ok(())
}

#[tokio::test]
async fn test_stock_without_id_is_accepted() -> TestResult {
    let stub = StubApi::start().await?;
    stub.respond("/stock/4", 200, r#"{"amount":7}"#);

    let client = ApiClient::new(&stub.api_config())?;
    let stock = client.stock(ProductId::new(4)).await?;

    assert_eq!(stock.amount, 7);
    assert_eq!(stock.id, None);
    Ok(())
}

#[tokio::test]
async fn test_stock_is_never_cached() -> TestResult {
    let stub = StubApi::start().await?;
    stub.set_stock(1, 3);

    let client = ApiClient::new(&stub.api_config())?;
    client.stock(ProductId::new(1)).await?;
    stub.set_stock(1, 0);
    let stock = client.stock(ProductId::new(1)).await?;

    assert_eq!(stock.amount, 0);
    assert_eq!(stub.requests_to("/stock/1"), 2);
    Ok(())
}

#[tokio::test]
async fn test_unknown_stock_is_not_found() -> TestResult {
    let stub = StubApi::start().await?;

    let client = ApiClient::new(&stub.api_config())?;
    let result = client.stock(ProductId::new(99)).await;

    assert!(matches!(result, Err(ApiError::NotFound(path)) if path == "/stock/99"));
    Ok(())
}

#[tokio::test]
async fn test_server_error_maps_to_status() -> TestResult {
    let stub = StubApi::start().await?;
    stub.respond("/stock/1", 500, r#"{"error":"database unavailable"}"#);

    let client = ApiClient::new(&stub.api_config())?;
    let result = client.stock(ProductId::new(1)).await;

    match result {
        Err(ApiError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.contains("database unavailable"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_malformed_body_maps_to_parse() -> TestResult {
    let stub = StubApi::start().await?;
    stub.respond("/stock/1", 200, r#"{"amount":"lots"}"#);

    let client = ApiClient::new(&stub.api_config())?;
    let result = client.stock(ProductId::new(1)).await;

    assert!(matches!(result, Err(ApiError::Parse(_))));
    Ok(())
}

#[tokio::test]
async fn test_negative_stock_is_rejected() -> TestResult {
    let stub = StubApi::start().await?;
    stub.respond("/stock/1", 200, r#"{"id":1,"amount":-2}"#);

    let client = ApiClient::new(&stub.api_config())?;
    let result = client.stock(ProductId::new(1)).await;

    assert!(matches!(result, Err(ApiError::Parse(_))));
    Ok(())
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
async fn test_fetches_product() -> TestResult {
    let stub = StubApi::start().await?;
    stub.add_product(2, "Tênis VR Caminhada Confortável", 139.9);

    let client = ApiClient::new(&stub.api_config())?;
    let product = client.product(ProductId::new(2)).await?;

    assert_eq!(product.id, ProductId::new(2));
    assert_eq!(product.title, "Tênis VR Caminhada Confortável");
    assert_eq!(product.price, Price::from_cents(13_990));
    assert_eq!(product.image, "https://cdn.rocketshoes.test/2.jpg");
    Ok(())
}

#[tokio::test]
async fn test_products_are_cached() -> TestResult {
    let stub = StubApi::start().await?;
    stub.add_product(2, "Runner", 99.0);

    let client = ApiClient::new(&stub.api_config())?;
    let first = client.product(ProductId::new(2)).await?;
    let second = client.clone().product(ProductId::new(2)).await?;

    assert_eq!(first, second);
    assert_eq!(stub.requests_to("/products/2"), 1);
    Ok(())
}

#[tokio::test]
async fn test_zero_ttl_fetches_every_time() -> TestResult {
    let stub = StubApi::start().await?;
    stub.add_product(2, "Runner", 99.0);

    let mut config = stub.api_config();
    config.product_cache_ttl = Duration::ZERO;
    let client = ApiClient::new(&config)?;

    client.product(ProductId::new(2)).await?;
    client.product(ProductId::new(2)).await?;

    assert_eq!(stub.requests_to("/products/2"), 2);
    Ok(())
}

#[tokio::test]
async fn test_failed_product_lookup_is_not_cached() -> TestResult {
    let stub = StubApi::start().await?;
    stub.respond("/products/5", 503, "");

    let client = ApiClient::new(&stub.api_config())?;
    assert!(client.product(ProductId::new(5)).await.is_err());

    stub.clear_response("/products/5");
    stub.add_product(5, "Trail", 250.0);
    let product = client.product(ProductId::new(5)).await?;

    assert_eq!(product.title, "Trail");
    assert_eq!(stub.requests_to("/products/5"), 2);
    Ok(())
}

#[tokio::test]
async fn test_product_with_other_id_is_rejected() -> TestResult {
    let stub = StubApi::start().await?;
    stub.respond(
        "/products/1",
        200,
        r#"{"id":2,"title":"Wrong","price":10.0,"image":"x"}"#,
    );

    let client = ApiClient::new(&stub.api_config())?;
    let result = client.product(ProductId::new(1)).await;

    assert!(matches!(
        result,
        Err(ApiError::ProductMismatch { requested, returned })
            if requested == ProductId::new(1) && returned == ProductId::new(2)
    ));
    Ok(())
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_sends_bearer_token() -> TestResult {
    let stub = StubApi::start().await?;
    stub.require_token("s3cret");
    stub.set_stock(1, 3);

    let mut config = stub.api_config();
    config.token = Some(SecretString::from("s3cret"));
    let client = ApiClient::new(&config)?;

    assert_eq!(client.stock(ProductId::new(1)).await?.amount, 3);
    Ok(())
}

#[tokio::test]
async fn test_missing_token_is_rejected() -> TestResult {
    let stub = StubApi::start().await?;
    stub.require_token("s3cret");
    stub.set_stock(1, 3);

    let client = ApiClient::new(&stub.api_config())?;
    let result = client.stock(ProductId::new(1)).await;

    assert!(matches!(result, Err(ApiError::Status { status: 401, .. })));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_api_is_http_error() -> TestResult {
    let stub = StubApi::start().await?;
    let mut config = stub.api_config();
    drop(stub);
    config.timeout = Duration::from_secs(2);

    // Give the aborted server a moment to release the port.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = ApiClient::new(&config)?;
    let result = client.stock(ProductId::new(1)).await;

    assert!(matches!(result, Err(ApiError::Http(_))));
    Ok(())
}
