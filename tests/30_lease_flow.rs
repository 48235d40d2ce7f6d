//! End-to-end lease admission against a real database.
//! Runs only when TEST_DATABASE_URL is set; otherwise each test is a no-op.

mod common;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{ApiClient, TestServer};

async fn server() -> Result<Option<TestServer>> {
    if common::database_url().is_none() {
        eprintln!("TEST_DATABASE_URL not set; skipping database-backed test");
        return Ok(None);
    }
    Ok(Some(TestServer::start().await?))
}

fn id(body: &Value) -> Result<i64> {
    body["data"]["id"].as_i64().context("response has no data.id")
}

async fn create_unit(client: &ApiClient<'_>, unit_number: &str) -> Result<i64> {
    let (status, property) = client
        .post("/properties", json!({"name": "Maple Court", "address": "1 Maple St", "city": "Springfield"}))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", property);

    let (status, unit) = client
        .post(
            &format!("/properties/{}/units", id(&property)?),
            json!({"unit_number": unit_number, "rent_amount": 1000, "bedrooms": 2}),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", unit);
    assert_eq!(unit["data"]["status"], "vacant");
    id(&unit)
}

async fn create_tenant(client: &ApiClient<'_>, name: &str) -> Result<i64> {
    let email = format!("{}@example.com", common::unique("tenant"));
    let (status, tenant) = client
        .post("/tenants", json!({"name": name, "email": email, "phone": "555-0100"}))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", tenant);
    id(&tenant)
}

fn lease(unit_id: i64, tenant_id: i64, start: &str, end: &str, rent: i64, deposit: i64) -> Value {
    json!({
        "unit_id": unit_id,
        "tenant_id": tenant_id,
        "start_date": start,
        "end_date": end,
        "monthly_rent": rent,
        "security_deposit": deposit,
        "status": "active"
    })
}

async fn unit_status(client: &ApiClient<'_>, unit_id: i64) -> Result<String> {
    let (status, unit) = client.get(&format!("/units/{}", unit_id)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(unit["data"]["status"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn second_lease_on_an_occupied_unit_is_rejected() -> Result<()> {
    let Some(server) = server().await? else { return Ok(()) };
    let mut client = ApiClient::new(&server);
    client.register_landlord().await?;

    let unit = create_unit(&client, "4B").await?;
    let first_tenant = create_tenant(&client, "Ada Tenant").await?;
    let second_tenant = create_tenant(&client, "Bo Tenant").await?;

    let (status, body) = client
        .post("/leases", lease(unit, first_tenant, "2025-06-01", "2026-06-01", 1000, 500))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["message"], "Lease created successfully");
    assert_eq!(body["data"]["tenant"]["id"], first_tenant);
    assert_eq!(unit_status(&client, unit).await?, "occupied");

    let (status, body) = client
        .post("/leases", lease(unit, second_tenant, "2025-07-01", "2026-07-01", 1200, 600))
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Unit is already leased");

    let (_, listing) = client.get(&format!("/leases?unit_id={}", unit)).await?;
    assert_eq!(listing["meta"]["total"], 1);
    assert_eq!(listing["data"][0]["tenant"]["id"], first_tenant);
    assert_eq!(unit_status(&client, unit).await?, "occupied");
    Ok(())
}

#[tokio::test]
async fn ending_a_lease_keeps_the_unit_occupied() -> Result<()> {
    let Some(server) = server().await? else { return Ok(()) };
    let mut client = ApiClient::new(&server);
    client.register_landlord().await?;

    let unit = create_unit(&client, "1A").await?;
    let tenant = create_tenant(&client, "Cy Tenant").await?;
    let next_tenant = create_tenant(&client, "Di Tenant").await?;

    let (_, created) = client
        .post("/leases", lease(unit, tenant, "2025-01-01", "2025-12-31", 900, 0))
        .await?;
    let lease_id = id(&created)?;

    let (status, body) = client
        .patch(&format!("/leases/{}", lease_id), json!({"status": "ended"}))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "ended");
    assert_eq!(unit_status(&client, unit).await?, "occupied");

    // With no active lease left the unit can be leased again
    let (status, body) = client
        .post("/leases", lease(unit, next_tenant, "2026-01-01", "2026-12-31", 950, 0))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    // Reactivating the ended lease would make two active leases
    let (status, body) = client
        .patch(&format!("/leases/{}", lease_id), json!({"status": "active"}))
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Unit is already leased");
    Ok(())
}

#[tokio::test]
async fn invalid_date_ranges_and_missing_references() -> Result<()> {
    let Some(server) = server().await? else { return Ok(()) };
    let mut client = ApiClient::new(&server);
    client.register_landlord().await?;

    let unit = create_unit(&client, "2C").await?;
    let tenant = create_tenant(&client, "Ed Tenant").await?;

    let (status, body) = client
        .post("/leases", lease(unit, tenant, "2025-06-01", "2025-06-01", 1000, 0))
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["field_errors"]["end_date"].is_string());

    let (status, body) = client
        .post("/leases", lease(i64::MAX, tenant, "2025-06-01", "2026-06-01", 1000, 0))
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["field_errors"]["unit_id"].is_string());

    assert_eq!(unit_status(&client, unit).await?, "vacant");
    Ok(())
}

#[tokio::test]
async fn concurrent_admissions_let_exactly_one_through() -> Result<()> {
    let Some(server) = server().await? else { return Ok(()) };
    let mut client = ApiClient::new(&server);
    client.register_landlord().await?;

    let unit = create_unit(&client, "9Z").await?;
    let first = create_tenant(&client, "Fay Tenant").await?;
    let second = create_tenant(&client, "Gus Tenant").await?;

    let first_body = lease(unit, first, "2025-06-01", "2026-06-01", 1000, 500);
    let second_body = lease(unit, second, "2025-06-01", "2026-06-01", 1000, 500);
    let (a, b) = tokio::join!(client.post("/leases", first_body), client.post("/leases", second_body));

    let mut statuses = vec![a?.0, b?.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::UNPROCESSABLE_ENTITY]);

    let (_, listing) = client.get(&format!("/leases?unit_id={}", unit)).await?;
    assert_eq!(listing["meta"]["total"], 1);
    Ok(())
}

#[tokio::test]
async fn payments_properties_and_logout() -> Result<()> {
    let Some(server) = server().await? else { return Ok(()) };
    let mut client = ApiClient::new(&server);
    let user = client.register_landlord().await?;

    let unit = create_unit(&client, "3D").await?;
    let tenant = create_tenant(&client, "Hal Tenant").await?;
    let (_, created) = client
        .post("/leases", lease(unit, tenant, "2025-06-01", "2026-06-01", 1000, 0))
        .await?;

    let (status, payment) = client
        .post(
            "/payments",
            json!({
                "lease_id": id(&created)?,
                "amount": 1000,
                "payment_date": "2025-06-03",
                "payment_method": "bank_transfer"
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", payment);
    assert_eq!(payment["data"]["status"], "completed");
    assert_eq!(payment["data"]["lease"]["tenant"]["id"], tenant);

    // Landlords only see their own properties; the listing reflects the one just created
    let (status, listing) = client.get("/properties").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["meta"]["total"], 1);
    assert_eq!(listing["data"][0]["landlord"]["id"], user["id"]);

    let (status, me) = client.get("/me").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["role"], "landlord");

    let (status, _) = client.post("/logout", json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = client.get("/me").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

fn listed_name(listing: &Value, property_id: i64) -> Option<String> {
    listing["data"]
        .as_array()?
        .iter()
        .find(|p| p["id"] == property_id)
        .and_then(|p| p["name"].as_str())
        .map(str::to_string)
}

#[tokio::test]
async fn property_writes_forget_only_the_owners_listing() -> Result<()> {
    let Some(server) = server().await? else { return Ok(()) };
    let mut landlord = ApiClient::new(&server);
    landlord.register_landlord().await?;
    let mut agent = ApiClient::new(&server);
    agent.register_as("agent").await?;

    let (status, property) = landlord
        .post("/properties", json!({"name": "Maple Court", "address": "1 Maple St"}))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", property);
    let property_id = id(&property)?;
    let listing = "/properties?per_page=100";

    // Both users now hold a cached listing that includes the property
    let (_, body) = landlord.get(listing).await?;
    assert_eq!(listed_name(&body, property_id).as_deref(), Some("Maple Court"));
    let (_, body) = agent.get(listing).await?;
    assert_eq!(listed_name(&body, property_id).as_deref(), Some("Maple Court"));

    let (status, _) = landlord
        .patch(&format!("/properties/{}", property_id), json!({"name": "Birch Court"}))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = landlord.get(listing).await?;
    assert_eq!(listed_name(&body, property_id).as_deref(), Some("Birch Court"));
    let (_, body) = agent.get(listing).await?;
    assert_eq!(listed_name(&body, property_id).as_deref(), Some("Maple Court"));

    // A write by someone else still clears the owning landlord's entry, not the writer's
    let (status, _) = agent
        .patch(&format!("/properties/{}", property_id), json!({"name": "Cedar Court"}))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = landlord.get(listing).await?;
    assert_eq!(listed_name(&body, property_id).as_deref(), Some("Cedar Court"));
    let (_, body) = agent.get(listing).await?;
    assert_eq!(listed_name(&body, property_id).as_deref(), Some("Maple Court"));
    Ok(())
}
