use std::sync::Arc;

use chrono::{Datelike, Local, Utc};
use compta_transport::config::AppConfig;
use compta_transport::dossiers::{
    AdminGate, BusinessType, ClientKey, Confirmation, DossierError, DossierService,
    MemoryBlobStore, MemoryPersistence,
};
use compta_transport::error::AppError;

use crate::infra::warn_if_not_durable;

/// Runs both workflows against in-memory storage; nothing touches the data directory.
pub(crate) fn run_demo(config: &AppConfig) -> Result<(), AppError> {
    let today = Local::now().date_naive();
    let last_year = today.year() - 1;
    let persistence = Arc::new(MemoryPersistence::default());
    let blobs = Arc::new(MemoryBlobStore::default());
    let mut service = DossierService::open(persistence.clone(), blobs);
    let admin = AdminGate::new(config.admin.secret.as_str()).authorize(&config.admin.secret)?;

    println!("Driver workflow");
    let mut draft = service.new_draft(today);
    draft.set_names("Jean", "Dupont");
    draft.set_business_type(BusinessType::Taxi);
    draft
        .select_period(3, last_year)
        .map_err(DossierError::from)?;
    for (type_key, file_name, bytes) in [
        ("facture_achat_vehicule", "facture-vehicule.pdf", &b"%PDF vehicle"[..]),
        ("abonnement_g7", "g7-mars.pdf", &b"%PDF g7"[..]),
    ] {
        let document = service.add_document(&mut draft, type_key, file_name, bytes, Utc::now())?;
        println!(
            "  uploaded {} as {} for {}/{}",
            document.display_name, document.type_key, document.month, document.year
        );
    }
    let applied = service.submit(&mut draft, today)?;
    warn_if_not_durable(&applied);
    println!("  dossier {}", applied.value.label());

    println!("\nAccountant workflow");
    let applied = service.close_year(&admin, last_year, Utc::now());
    warn_if_not_durable(&applied);
    println!("  closed {last_year}");

    let mut returning = service.new_draft(today);
    returning.set_names("Jean", "Dupont");
    service.resume(&mut returning);
    returning
        .select_period(4, last_year)
        .map_err(DossierError::from)?;
    match service.add_document(&mut returning, "peages", "peage.pdf", b"toll", Utc::now()) {
        Err(err) => println!("  late upload refused: {err}"),
        Ok(_) => println!("  late upload unexpectedly accepted"),
    }

    let key = ClientKey::new("Jean", "Dupont");
    let report = service.client_report(&admin, &key)?;
    for year in &report.years {
        for month in &year.months {
            println!(
                "  {} {}: {} document(s){}",
                month.month_label,
                year.year,
                month.documents.len(),
                if year.is_closed { " [closed]" } else { "" }
            );
        }
    }
    let exported = service.export_all(&admin, &key)?;
    println!("  export would produce {} file(s)", exported.len());

    if let Err(err) = service.delete_client(&admin, &key, Confirmation::Refused) {
        println!("  delete without confirmation: {err}");
    }
    let applied = service.delete_client(&admin, &key, Confirmation::Confirmed)?;
    warn_if_not_durable(&applied);
    println!(
        "  deleted dossier; {} client(s) left in storage",
        persistence.snapshot().clients.len()
    );
    Ok(())
}
