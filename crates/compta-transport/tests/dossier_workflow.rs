//! End-to-end scenarios through the public service facade, backed by the on-disk adapters so
//! that restarts observe exactly what was committed.

mod common {
    use std::path::PathBuf;
    use std::sync::Arc;

    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    use compta_transport::dossiers::{
        AdminCapability, AdminGate, DossierService, FsBlobStore, JsonFilePersistence,
    };

    pub(super) type DiskService = DossierService<JsonFilePersistence, FsBlobStore>;

    pub(super) struct DataDir(pub(super) PathBuf);

    impl DataDir {
        pub(super) fn new(label: &str) -> Self {
            let path = std::env::temp_dir().join(format!(
                "compta-transport-it-{label}-{}",
                std::process::id()
            ));
            let _ = std::fs::remove_dir_all(&path);
            Self(path)
        }

        pub(super) fn open(&self) -> DiskService {
            DossierService::open(
                Arc::new(JsonFilePersistence::new(self.0.join("dossiers.json"))),
                Arc::new(FsBlobStore::new(self.0.join("blobs"))),
            )
        }
    }

    impl Drop for DataDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    pub(super) fn admin() -> AdminCapability {
        AdminGate::new("admin2024")
            .authorize("admin2024")
            .expect("secret accepted")
    }

    pub(super) fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).expect("valid date")
    }

    pub(super) fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0)
            .single()
            .expect("valid timestamp")
    }
}

use common::{admin, now, today, DataDir};
use compta_transport::dossiers::{
    group_by_year_then_month, BusinessType, ClientKey, Confirmation, DocumentError, DossierError,
};

#[test]
fn returning_driver_finds_submitted_documents_after_restart() {
    let data = DataDir::new("returning");
    let mut service = data.open();

    let mut draft = service.new_draft(today());
    draft.set_names("Jean", "Dupont");
    draft.set_business_type(BusinessType::Taxi);
    draft.select_period(3, 2024).expect("valid period");
    let uploaded = service
        .add_document(
            &mut draft,
            "facture_achat_vehicule",
            "facture-vehicule.pdf",
            b"%PDF-1.7 binary \x00\x01\x02",
            now(),
        )
        .expect("upload accepted");
    let applied = service.submit(&mut draft, today()).expect("submitted");
    assert!(applied.is_durable());
    drop(service);

    let restarted = data.open();
    assert!(restarted.load_warning().is_none());
    let lookup = restarted.lookup("Jean", "Dupont").expect("client found");
    assert_eq!(lookup.business_type, BusinessType::Taxi);
    assert_eq!(lookup.documents.len(), 1);
    assert_eq!(lookup.documents[0], uploaded);

    let files = restarted
        .export_all(&admin(), &ClientKey::new("Jean", "Dupont"))
        .expect("export");
    assert_eq!(files[0].file_name, "facture-vehicule.pdf");
    assert_eq!(files[0].bytes, b"%PDF-1.7 binary \x00\x01\x02");
}

#[test]
fn closing_a_year_blocks_only_new_uploads_for_that_year() {
    let data = DataDir::new("closing");
    let mut service = data.open();

    let mut draft = service.new_draft(today());
    draft.set_names("Amina", "Benali");
    draft.set_business_type(BusinessType::Vtc);
    draft.select_period(11, 2023).expect("valid period");
    service
        .add_document(&mut draft, "location_vehicule_vtc", "loc.pdf", b"lease", now())
        .expect("2023 still open");
    let _ = service.submit(&mut draft, today()).expect("submitted");

    let _ = service.close_year(&admin(), 2023, now());
    let mut service = data.open();

    let mut returning = service.new_draft(today());
    returning.set_names("Amina", "Benali");
    assert!(service.resume(&mut returning));
    returning.select_period(12, 2023).expect("valid period");
    let err = service
        .add_document(&mut returning, "peages", "peage.pdf", b"toll", now())
        .expect_err("2023 closed");
    assert!(matches!(
        err,
        DossierError::Document(DocumentError::YearClosed { year: 2023 })
    ));

    returning.select_period(1, 2024).expect("valid period");
    service
        .add_document(&mut returning, "peages", "peage.pdf", b"toll", now())
        .expect("2024 open");
    let _ = service.submit(&mut returning, today()).expect("resubmitted");

    let report = service
        .client_report(&admin(), &ClientKey::new("Amina", "Benali"))
        .expect("report");
    assert_eq!(report.total_documents, 2, "closed-year document still visible");
    assert!(report.years[0].is_closed);

    let _ = service.reopen_year(&admin(), 2023);
    assert!(!data.open().is_year_closed(2023));
}

#[test]
fn admin_overview_groups_and_deletes() {
    let data = DataDir::new("admin");
    let mut service = data.open();

    let mut draft = service.new_draft(today());
    draft.set_names("Jean", "Dupont");
    for (month, year) in [(3, 2024), (3, 2024), (5, 2024), (1, 2025)] {
        draft.select_period(month, year).expect("valid period");
        service
            .add_document(&mut draft, "releve_bancaire", "releve.pdf", b"statement", now())
            .expect("upload");
    }
    let _ = service.submit(&mut draft, today()).expect("submitted");

    let record = service.clients(&admin())[0].clone();
    let handle = record.documents[0].content.0.clone();
    let blob_path = data.0.join("blobs").join(&handle[..2]).join(&handle);
    assert!(blob_path.exists());
    let grouped = group_by_year_then_month(&record.documents);
    assert_eq!(grouped[&2024][&3].len(), 2);
    assert_eq!(grouped[&2024][&5].len(), 1);
    assert_eq!(grouped[&2025][&1].len(), 1);

    let mut csv = Vec::new();
    service
        .write_documents_csv(&admin(), &mut csv)
        .expect("csv written");
    assert_eq!(String::from_utf8(csv).expect("utf8").lines().count(), 5);

    let key = ClientKey::new("Jean", "Dupont");
    assert!(service
        .delete_client(&admin(), &key, Confirmation::Refused)
        .is_err());
    let _ = service
        .delete_client(&admin(), &key, Confirmation::Confirmed)
        .expect("deleted");
    assert!(data.open().lookup("Jean", "Dupont").is_none());
    assert!(!blob_path.exists(), "deleted dossier keeps no document content");
}
