// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data-management subcommands: init, tracking, settings, shipments,
//! services, messages, and admin accounts.
//!
//! Handlers write their report to `out` so they can be exercised without a
//! terminal.

use std::io::Write;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};
use waybill_auth::{ensure_admin, generate_password, PasswordHashing};
use waybill_config::model::WaybillConfig;
use waybill_core::{NewShipment, ShipmentStatus, StorageAdapter, WaybillError};
use waybill_storage::queries::{messages, services, settings, shipments};

const GENERATED_PASSWORD_LEN: usize = 20;

fn io_err(e: std::io::Error) -> WaybillError {
    WaybillError::Internal(format!("failed to write output: {e}"))
}

/// Bootstrap the database and make sure the configured admin exists.
pub async fn init(
    store: &dyn StorageAdapter,
    config: &WaybillConfig,
    out: &mut dyn Write,
) -> Result<(), WaybillError> {
    store.initialize().await?;
    writeln!(out, "Database ready at {}", config.storage.database_path).map_err(io_err)?;

    let hashing = PasswordHashing::new(&config.auth)?;
    let (password, generated) = match &config.admin.password {
        Some(password) => (SecretString::from(password.clone()), false),
        None => (generate_password(GENERATED_PASSWORD_LEN)?, true),
    };

    let username = &config.admin.username;
    if ensure_admin(store, &hashing, username, &password).await? {
        writeln!(out, "Created admin account '{username}'").map_err(io_err)?;
        if generated {
            writeln!(
                out,
                "Generated password (shown once): {}",
                password.expose_secret()
            )
            .map_err(io_err)?;
        }
    } else {
        writeln!(out, "Admin account '{username}' already exists").map_err(io_err)?;
    }
    Ok(())
}

/// Public tracking lookup.
pub async fn track(
    store: &dyn StorageAdapter,
    tracking_number: &str,
    json: bool,
    out: &mut dyn Write,
) -> Result<bool, WaybillError> {
    let Some(shipment) = shipments::find_by_tracking_number(store, tracking_number).await? else {
        writeln!(out, "No shipment found for tracking number {tracking_number}").map_err(io_err)?;
        return Ok(false);
    };

    if json {
        let body = serde_json::to_string_pretty(&shipment)
            .map_err(|e| WaybillError::Internal(format!("failed to encode shipment: {e}")))?;
        writeln!(out, "{body}").map_err(io_err)?;
    } else {
        writeln!(out, "Tracking number:  {}", shipment.tracking_number).map_err(io_err)?;
        writeln!(out, "Status:           {}", shipment.status).map_err(io_err)?;
        writeln!(out, "Route:            {} -> {}", shipment.origin, shipment.destination)
            .map_err(io_err)?;
        writeln!(out, "Current location: {}", shipment.current_location).map_err(io_err)?;
        writeln!(out, "Est. delivery:    {}", shipment.estimated_delivery).map_err(io_err)?;
        writeln!(out, "Sender:           {}", shipment.sender_name).map_err(io_err)?;
        writeln!(out, "Receiver:         {}", shipment.receiver_name).map_err(io_err)?;
    }
    Ok(true)
}

pub async fn settings_list(
    store: &dyn StorageAdapter,
    out: &mut dyn Write,
) -> Result<(), WaybillError> {
    for (key, value) in settings::all(store).await? {
        writeln!(out, "{key:<16} {value}").map_err(io_err)?;
    }
    Ok(())
}

pub async fn settings_set(
    store: &dyn StorageAdapter,
    key: &str,
    value: &str,
    out: &mut dyn Write,
) -> Result<(), WaybillError> {
    settings::upsert(store, key, value).await?;
    info!(key, "site setting updated");
    writeln!(out, "{key} = {value}").map_err(io_err)
}

pub async fn shipments_list(
    store: &dyn StorageAdapter,
    limit: i64,
    out: &mut dyn Write,
) -> Result<(), WaybillError> {
    let rows = shipments::list_recent(store, limit).await?;
    if rows.is_empty() {
        return writeln!(out, "No shipments.").map_err(io_err);
    }
    for s in rows {
        writeln!(
            out,
            "{:<12} {:<12} {:<16} {} -> {}  ({})",
            s.tracking_number, s.status, s.current_location, s.origin, s.destination, s.created_at
        )
        .map_err(io_err)?;
    }
    Ok(())
}

fn note_unusual_status(status: &str) {
    if status.parse::<ShipmentStatus>().is_err() {
        warn!(status, "status is not one of the usual labels");
    }
}

pub async fn shipments_add(
    store: &dyn StorageAdapter,
    shipment: &NewShipment,
    out: &mut dyn Write,
) -> Result<(), WaybillError> {
    note_unusual_status(&shipment.status);
    match shipments::create(store, shipment).await {
        Ok(id) => {
            info!(tracking_number = %shipment.tracking_number, id, "shipment created");
            writeln!(out, "Created shipment {} (id {id})", shipment.tracking_number)
                .map_err(io_err)
        }
        Err(e) if e.is_constraint_violation() => Err(WaybillError::ConstraintViolation {
            message: format!(
                "tracking number {} is already in use",
                shipment.tracking_number
            ),
        }),
        Err(e) => Err(e),
    }
}

pub async fn shipments_update(
    store: &dyn StorageAdapter,
    tracking_number: &str,
    location: &str,
    status: &str,
    estimated_delivery: Option<&str>,
    out: &mut dyn Write,
) -> Result<(), WaybillError> {
    note_unusual_status(status);
    let shipment = shipments::find_by_tracking_number(store, tracking_number)
        .await?
        .ok_or_else(|| WaybillError::query(format!("no shipment with tracking number {tracking_number}")))?;
    shipments::update_progress(store, shipment.id, location, status, estimated_delivery).await?;
    info!(tracking_number, status, "shipment updated");
    writeln!(out, "Updated {tracking_number}: {status} at {location}").map_err(io_err)
}

pub async fn services_list(
    store: &dyn StorageAdapter,
    out: &mut dyn Write,
) -> Result<(), WaybillError> {
    for s in services::list(store, None).await? {
        writeln!(out, "{:>4}  {:<24} {}", s.id, s.title, s.description).map_err(io_err)?;
    }
    Ok(())
}

pub async fn services_add(
    store: &dyn StorageAdapter,
    title: &str,
    description: &str,
    image: Option<&str>,
    out: &mut dyn Write,
) -> Result<(), WaybillError> {
    let id = services::create(store, title, description, image).await?;
    writeln!(out, "Created service '{title}' (id {id})").map_err(io_err)
}

pub async fn services_delete(
    store: &dyn StorageAdapter,
    id: i64,
    out: &mut dyn Write,
) -> Result<(), WaybillError> {
    if !services::delete(store, id).await? {
        return Err(WaybillError::query(format!("no service with id {id}")));
    }
    info!(id, "service deleted");
    writeln!(out, "Deleted service {id}").map_err(io_err)
}

pub async fn messages_list(
    store: &dyn StorageAdapter,
    limit: i64,
    quotes_only: bool,
    out: &mut dyn Write,
) -> Result<(), WaybillError> {
    let rows = if quotes_only {
        messages::list_quotes(store, limit).await?
    } else {
        messages::list_recent(store, limit).await?
    };
    for m in &rows {
        writeln!(
            out,
            "[{}] {} <{}> {}: {}",
            m.created_at, m.name, m.email, m.subject, m.message
        )
        .map_err(io_err)?;
    }
    Ok(())
}

pub async fn admin_create(
    store: &dyn StorageAdapter,
    config: &WaybillConfig,
    username: &str,
    password: &SecretString,
    out: &mut dyn Write,
) -> Result<(), WaybillError> {
    let hashing = PasswordHashing::new(&config.auth)?;
    if ensure_admin(store, &hashing, username, password).await? {
        writeln!(out, "Created admin account '{username}'").map_err(io_err)
    } else {
        Err(WaybillError::Auth(format!("user '{username}' already exists")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waybill_storage::SqliteStore;

    fn setup() -> (SqliteStore, WaybillConfig, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = WaybillConfig::default();
        config.storage.database_path = dir.path().join("site.db").to_string_lossy().into_owned();
        config.auth.kdf_memory_cost = 8192;
        config.auth.kdf_iterations = 1;
        let store = SqliteStore::new(config.storage.clone());
        (store, config, dir)
    }

    fn text(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn init_generates_admin_password_once() {
        let (store, config, _dir) = setup();

        let mut out = Vec::new();
        init(&store, &config, &mut out).await.unwrap();
        let first = text(out);
        assert!(first.contains("Created admin account 'admin'"));
        assert!(first.contains("Generated password"));

        let mut out = Vec::new();
        init(&store, &config, &mut out).await.unwrap();
        let second = text(out);
        assert!(second.contains("already exists"));
        assert!(!second.contains("Generated password"));
    }

    #[tokio::test]
    async fn add_update_and_track() {
        let (store, _config, _dir) = setup();
        let new = NewShipment {
            tracking_number: "GH12345".into(),
            origin: "Accra".into(),
            destination: "Tamale".into(),
            current_location: "Accra".into(),
            status: "Pending".into(),
            ..NewShipment::default()
        };
        shipments_add(&store, &new, &mut std::io::sink()).await.unwrap();
        shipments_update(&store, "GH12345", "Kintampo", "In Transit", Some("2026-10-21"), &mut std::io::sink())
            .await
            .unwrap();

        let mut out = Vec::new();
        assert!(track(&store, "GH12345", false, &mut out).await.unwrap());
        let report = text(out);
        assert!(report.contains("In Transit"));
        assert!(report.contains("Kintampo"));

        let mut out = Vec::new();
        assert!(!track(&store, "GH00000", false, &mut out).await.unwrap());
        assert!(text(out).contains("No shipment found"));
    }

    #[tokio::test]
    async fn duplicate_tracking_number_is_reported() {
        let (store, _config, _dir) = setup();
        let new = NewShipment {
            tracking_number: "GH1".into(),
            status: "Pending".into(),
            ..NewShipment::default()
        };
        shipments_add(&store, &new, &mut std::io::sink()).await.unwrap();
        let err = shipments_add(&store, &new, &mut std::io::sink()).await.unwrap_err();
        assert!(err.is_constraint_violation());
        assert!(err.to_string().contains("already in use"));
    }

    #[tokio::test]
    async fn update_without_eta_keeps_estimated_delivery() {
        let (store, _config, _dir) = setup();
        let new = NewShipment {
            tracking_number: "GH1".into(),
            status: "Pending".into(),
            estimated_delivery: "2026-11-02".into(),
            ..NewShipment::default()
        };
        shipments_add(&store, &new, &mut std::io::sink()).await.unwrap();
        shipments_update(&store, "GH1", "Kumasi", "In Transit", None, &mut std::io::sink())
            .await
            .unwrap();

        let shipment = shipments::find_by_tracking_number(&store, "GH1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(shipment.current_location, "Kumasi");
        assert_eq!(shipment.estimated_delivery, "2026-11-02");
    }

    #[tokio::test]
    async fn deleting_unknown_service_is_an_error() {
        let (store, _config, _dir) = setup();
        services_add(&store, "Road Haulage", "", None, &mut std::io::sink())
            .await
            .unwrap();

        let mut out = Vec::new();
        services_delete(&store, 1, &mut out).await.unwrap();
        assert!(text(out).contains("Deleted service 1"));

        let mut out = Vec::new();
        let err = services_delete(&store, 1, &mut out).await.unwrap_err();
        assert!(err.to_string().contains("no service with id 1"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn track_json_is_an_object() {
        let (store, _config, _dir) = setup();
        let new = NewShipment {
            tracking_number: "GH55".into(),
            status: "Held".into(),
            ..NewShipment::default()
        };
        shipments_add(&store, &new, &mut std::io::sink()).await.unwrap();

        let mut out = Vec::new();
        track(&store, "GH55", true, &mut out).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["status"], "Held");
        assert_eq!(value["tracking_number"], "GH55");
    }

    #[tokio::test]
    async fn settings_set_then_list() {
        let (store, _config, _dir) = setup();
        settings_set(&store, "address", "Accra", &mut std::io::sink()).await.unwrap();
        let mut out = Vec::new();
        settings_list(&store, &mut out).await.unwrap();
        let listing = text(out);
        assert!(listing.lines().any(|l| l.starts_with("address") && l.ends_with("Accra")));
        assert_eq!(listing.lines().count(), 5);
    }

    #[tokio::test]
    async fn messages_filter_quotes() {
        let (store, _config, _dir) = setup();
        messages::submit_contact(&store, "Yaa", "yaa@example.com", "Hello", "Hi there")
            .await
            .unwrap();
        messages::submit_quote(&store, "Kojo", "kojo@example.com", "Two pallets to Lome")
            .await
            .unwrap();

        let mut out = Vec::new();
        messages_list(&store, 10, true, &mut out).await.unwrap();
        let listing = text(out);
        assert_eq!(listing.lines().count(), 1);
        assert!(listing.contains("Two pallets to Lome"));
    }

    #[tokio::test]
    async fn quote_filter_applies_before_limit() {
        let (store, _config, _dir) = setup();
        messages::submit_quote(&store, "Kojo", "kojo@example.com", "Flatbed to Ouagadougou")
            .await
            .unwrap();
        for n in 0..3 {
            messages::submit_contact(&store, "Yaa", "yaa@example.com", "Hello", &format!("hi {n}"))
                .await
                .unwrap();
        }

        let mut out = Vec::new();
        messages_list(&store, 2, true, &mut out).await.unwrap();
        assert!(text(out).contains("Flatbed to Ouagadougou"));
    }

    #[tokio::test]
    async fn admin_create_refuses_existing_user() {
        let (store, config, _dir) = setup();
        let pw = SecretString::from("s3cret".to_string());
        admin_create(&store, &config, "ops", &pw, &mut std::io::sink()).await.unwrap();
        let err = admin_create(&store, &config, "ops", &pw, &mut std::io::sink())
            .await
            .unwrap_err();
        assert!(matches!(err, WaybillError::Auth(_)));
    }
}
