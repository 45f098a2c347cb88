//! Integration tests for artifact generation
//!
//! Each test runs the orchestrator against a live in-memory SQLite schema and
//! a temporary project directory.

use std::fs;
use std::path::Path;

use acton_forge::detect::BindingSource;
use acton_forge::prelude::*;
use tempfile::{tempdir, TempDir};

const INVOICES: &str = "
CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
CREATE TABLE invoices (
    id INTEGER PRIMARY KEY,
    number VARCHAR(50) NOT NULL UNIQUE,
    status VARCHAR(10) NOT NULL CHECK (status IN ('draft', 'sent', 'paid')),
    customer_id INTEGER NULL REFERENCES customers(id),
    created_at TIMESTAMP,
    updated_at TIMESTAMP
);";

fn project() -> (TempDir, ForgeConfig, SqlxCatalog) {
    let dir = tempdir().unwrap();
    let config = ForgeConfig::for_project(dir.path());
    let catalog = SqlxCatalog::try_connect("sqlite::memory:").unwrap();
    catalog.execute(INVOICES).unwrap();
    (dir, config, catalog)
}

fn invoice(kinds: Vec<ArtifactKind>) -> GenerationRequest {
    GenerationRequest::new(EntityRef::new("Invoice"), kinds)
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_invoice_end_to_end() {
    let (dir, config, catalog) = project();
    let mut prompt = DeclineOverwrite;
    let mut orchestrator = ArtifactOrchestrator::new(&config, &catalog, &mut prompt);

    let outcome = orchestrator
        .generate(&invoice(vec![ArtifactKind::TransferObject, ArtifactKind::Controller]))
        .unwrap();

    let data = outcome.of_kind(ArtifactKind::TransferObject).next().unwrap();
    assert_eq!(data.identifier, "crate::dto::invoice_data::InvoiceData");
    assert_eq!(outcome.primary.as_deref(), Some(data.identifier.as_str()));

    let transfer_object = read(&data.path);
    assert!(transfer_object.contains("pub struct InvoiceData {"));
    assert!(transfer_object.contains("pub number: String,"));
    assert!(transfer_object.contains("pub status: crate::enums::invoice_status::InvoiceStatus,"));
    assert!(transfer_object.contains("pub customer_id: Option<i32>,"));
    assert!(!transfer_object.contains("created_at"));

    let status = outcome.of_kind(ArtifactKind::Enum).next().unwrap();
    assert_eq!(status.identifier, "crate::enums::invoice_status::InvoiceStatus");
    let enumeration = read(&status.path);
    assert!(enumeration.contains("pub enum InvoiceStatus {"));
    for (variant, value) in [("Draft", "draft"), ("Sent", "sent"), ("Paid", "paid")] {
        assert!(enumeration.contains(&format!("#[serde(rename = \"{value}\")]")));
        assert!(enumeration.contains(&format!("    {variant},")));
    }

    let controller = outcome.of_kind(ArtifactKind::Controller).next().unwrap();
    let handlers = read(&controller.path);
    assert!(handlers.contains(&format!("Result<Json<Vec<{}>>, StatusCode>", data.identifier)));
    assert!(handlers.contains(&format!("sqlx::query_as::<_, {}>(", data.identifier)));
    assert!(handlers.contains("crate::validators::invoice_request::InvoiceRequest"));
    assert!(handlers.contains("crate::serializers::invoice_resource::InvoiceResource"));
    assert!(dir.path().join("src/validators/invoice_request.rs").is_file());
    assert!(dir.path().join("src/serializers/invoice_resource.rs").is_file());
    assert_eq!(outcome.of_kind(ArtifactKind::Validator).count(), 1);
    assert_eq!(outcome.of_kind(ArtifactKind::Serializer).count(), 1);
    assert!(handlers.contains("type Pool = sqlx::SqlitePool;"));
    assert!(handlers.contains("INSERT INTO invoices (number, status, customer_id) VALUES (?, ?, ?)"));
    assert!(!handlers.contains("{{"));

    assert_eq!(read(&dir.path().join("src/dto/mod.rs")), "pub mod invoice_data;\n");
    assert_eq!(read(&dir.path().join("src/enums/mod.rs")), "pub mod invoice_status;\n");
}

#[test]
fn test_enum_binding_is_idempotent() {
    let (_dir, config, catalog) = project();
    let mut prompt = DeclineOverwrite;
    let mut orchestrator = ArtifactOrchestrator::new(&config, &catalog, &mut prompt);
    let request = invoice(vec![ArtifactKind::TransferObject]);

    let first = orchestrator.generate(&request).unwrap();
    let synthesized: Vec<_> = first.of_kind(ArtifactKind::Enum).collect();
    assert_eq!(synthesized.len(), 1);
    assert_eq!(synthesized[0].status, WriteStatus::Created);

    let second = orchestrator.generate(&request).unwrap();
    assert_eq!(second.of_kind(ArtifactKind::Enum).count(), 0);
    let data = second.of_kind(ArtifactKind::TransferObject).next().unwrap();
    assert_eq!(data.status, WriteStatus::Unchanged);

    let detector = CapabilityDetector::new(&config);
    let mut analysis = detector.analyze(&EntityRef::new("Invoice"));
    let mut columns = SchemaIntrospector::new(&catalog).columns(&ColumnQuery::new("invoices"));
    detector.complete_enum_bindings(&mut analysis, &mut columns);
    let binding = columns[1].enum_binding.clone().unwrap();
    assert_eq!(binding.path, "crate::enums::invoice_status::InvoiceStatus");
    assert_eq!(binding.source, BindingSource::Convention);
}

#[test]
fn test_existing_matching_enum_is_reused() {
    let (dir, config, catalog) = project();
    fs::create_dir_all(dir.path().join("src/enums")).unwrap();
    fs::write(
        dir.path().join("src/enums/invoice_status.rs"),
        "pub enum InvoiceStatus {\n    Draft,\n    Sent,\n    Paid,\n}\n",
    )
    .unwrap();

    let mut prompt = DeclineOverwrite;
    let mut orchestrator = ArtifactOrchestrator::new(&config, &catalog, &mut prompt);
    let outcome = orchestrator
        .generate(&invoice(vec![ArtifactKind::TransferObject]))
        .unwrap();

    assert_eq!(outcome.of_kind(ArtifactKind::Enum).count(), 0);
    let data = outcome.of_kind(ArtifactKind::TransferObject).next().unwrap();
    assert!(read(&data.path).contains("pub status: crate::enums::invoice_status::InvoiceStatus,"));
}

#[test]
fn test_enum_with_different_values_is_not_bound() {
    let (dir, config, catalog) = project();
    fs::create_dir_all(dir.path().join("src/enums")).unwrap();
    let unrelated = "pub enum InvoiceStatus {\n    Open,\n    Closed,\n}\n";
    fs::write(dir.path().join("src/enums/invoice_status.rs"), unrelated).unwrap();

    let mut declined = 0;
    let mut prompt = |_: &Path, _: &str, _: &str| {
        declined += 1;
        false
    };
    let outcome = ArtifactOrchestrator::new(&config, &catalog, &mut prompt)
        .generate(&invoice(vec![ArtifactKind::TransferObject]))
        .unwrap();

    let synthesized = outcome.of_kind(ArtifactKind::Enum).next().unwrap();
    assert_eq!(synthesized.status, WriteStatus::Declined);
    assert_eq!(declined, 1);
    assert_eq!(read(&dir.path().join("src/enums/invoice_status.rs")), unrelated);
}

#[test]
fn test_declined_overwrite_keeps_first_output() {
    let (dir, config, catalog) = project();
    let request = invoice(vec![ArtifactKind::Serializer]);
    let path = dir.path().join("src/serializers/invoice_resource.rs");

    let mut prompt = DeclineOverwrite;
    ArtifactOrchestrator::new(&config, &catalog, &mut prompt)
        .generate(&request)
        .unwrap();
    let first = fs::read(&path).unwrap();

    let overrides = dir.path().join(".acton-forge/templates");
    fs::create_dir_all(&overrides).unwrap();
    fs::write(overrides.join("serializer.rs.hbs"), "pub struct {{name}};\n").unwrap();

    let mut asked = Vec::new();
    let mut prompt = |path: &Path, existing: &str, proposed: &str| {
        asked.push((path.to_path_buf(), existing.to_string(), proposed.to_string()));
        false
    };
    let outcome = ArtifactOrchestrator::new(&config, &catalog, &mut prompt)
        .generate(&request)
        .unwrap();

    assert_eq!(outcome.artifacts[0].status, WriteStatus::Declined);
    assert_eq!(fs::read(&path).unwrap(), first);
    assert_eq!(asked.len(), 1);
    assert_eq!(asked[0].0, path);
    assert_eq!(asked[0].2, "pub struct InvoiceResource;\n");
}

#[test]
fn test_identical_regeneration_does_not_prompt() {
    let (dir, config, catalog) = project();
    let request = invoice(vec![ArtifactKind::Validator]);

    let mut prompt = DeclineOverwrite;
    ArtifactOrchestrator::new(&config, &catalog, &mut prompt)
        .generate(&request)
        .unwrap();
    let path = dir.path().join("src/validators/invoice_request.rs");
    let first = fs::read(&path).unwrap();

    let mut prompt = |_: &Path, _: &str, _: &str| -> bool { panic!("identical output must not prompt") };
    let outcome = ArtifactOrchestrator::new(&config, &catalog, &mut prompt)
        .generate(&request)
        .unwrap();

    assert!(outcome.artifacts.iter().all(|artifact| artifact.status == WriteStatus::Unchanged));
    assert_eq!(fs::read(&path).unwrap(), first);
}

#[test]
fn test_route_registered_once() {
    let (dir, config, catalog) = project();
    let mut prompt = DeclineOverwrite;
    let mut orchestrator = ArtifactOrchestrator::new(&config, &catalog, &mut prompt);
    let request = invoice(vec![ArtifactKind::Route]);

    let first = orchestrator.generate(&request).unwrap();
    let second = orchestrator.generate(&request).unwrap();

    let first_route = first.of_kind(ArtifactKind::Route).next().unwrap();
    assert_eq!(first_route.status, WriteStatus::Created);
    assert_eq!(first.of_kind(ArtifactKind::Controller).count(), 1);
    assert_eq!(second.artifacts.len(), 1);
    assert_eq!(second.artifacts[0].status, WriteStatus::AlreadyPresent);
    assert_eq!(first.primary.as_deref(), Some("crate::routes"));

    let registry = read(&dir.path().join("src/routes.rs"));
    assert_eq!(registry.matches("RouteRegistration::new(\"/invoices\"").count(), 1);
    assert!(registry.contains(
        "crate::controllers::invoice_controller::InvoiceController::router"
    ));
    assert_eq!(registry.matches("inventory::collect!").count(), 1);
}

#[test]
fn test_batch_reports_each_entity() {
    let (_dir, config, catalog) = project();
    let mut prompt = DeclineOverwrite;
    let mut orchestrator = ArtifactOrchestrator::new(&config, &catalog, &mut prompt);

    let report = orchestrator.run(&[
        invoice(vec![ArtifactKind::TransferObject]),
        GenerationRequest::new(EntityRef::new("Customer"), Vec::new()),
        GenerationRequest::new(EntityRef::new("Customer"), vec![ArtifactKind::Serializer]),
    ]);

    assert!(!report.is_success());
    assert_eq!(report.succeeded.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].entity.name, "Customer");
}

#[test]
fn test_enum_only_request_without_enumerated_columns() {
    let (_dir, config, catalog) = project();
    let mut prompt = DeclineOverwrite;
    let outcome = ArtifactOrchestrator::new(&config, &catalog, &mut prompt)
        .generate(&GenerationRequest::new(EntityRef::new("Customer"), vec![ArtifactKind::Enum]))
        .unwrap();

    assert!(outcome.primary.is_none());
    assert!(outcome.artifacts.is_empty());
}
