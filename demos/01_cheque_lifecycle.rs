/// cheque lifecycle - pending, cleared and bounced cheques
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use fee_ledger_rs::{
    AcademicYear, ChequeOutcome, Enrollment, FeeLedgerService, FeeSchedule, FeeStructureDocument,
    FeeType, LedgerConfig, MemoryStore, Money, SafeTimeProvider, School, TimeSource,
    TransactionRequest,
};

fn cheque(amount: i64) -> TransactionRequest {
    TransactionRequest::new()
        .academic_year("24-25")
        .payment_mode("Cheque")
        .account("Main")
        .date("2024-07-01")
        .fee_type(FeeType::TuitionFee)
        .amount(Money::from_major(amount))
        .remark("cheque no. 004512")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== cheque lifecycle ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();
    let year = AcademicYear::parse("24-25")?;

    let store = Arc::new(MemoryStore::new());
    store.put_school(
        School::new("SCH01", "Green Valley")
            .with_classes(["1st", "2nd"])
            .with_payment_modes(["Cash", "Cheque"])
            .with_accounts(["Main"]),
    )?;
    let mut structure = FeeStructureDocument::new("SCH01");
    let fees = FeeSchedule::new(Money::from_major(1000), Money::from_major(8000));
    structure.set_fee(year, "1st", "DS", None, fees);
    store.put_fee_structure(structure)?;

    let mut ledger = FeeLedgerService::new(store, LedgerConfig::default(), "SCH01")?;
    let student = ledger.enroll_student(Enrollment::new("Zoya", year, "1st", "DS"), &time)?;

    // cheques wait for clearance with a temporary receipt
    let good = ledger.record_transaction(student.id, &cheque(3000), &time)?;
    let bad = ledger.record_transaction(student.id, &cheque(2000), &time)?;
    println!("cheque 1: {:?} temp receipt {:?}", good.status, good.temp_receipt_id);
    println!("cheque 2: {:?} temp receipt {:?}", bad.status, bad.temp_receipt_id);

    let dues = ledger.dues(student.id)?;
    println!("outstanding while pending: {}", dues.total_outstanding);

    // bank reports back three days later
    controller.advance(Duration::days(3));
    let cleared =
        ledger.set_transaction_status(student.id, good.id, ChequeOutcome::Cleared, &time)?;
    let bounced = ledger.set_transaction_status(student.id, bad.id, ChequeOutcome::Bounced, &time)?;
    println!("\ncheque 1: {:?} receipt {:?}", cleared.status, cleared.receipt_id);
    println!("cheque 2: {:?}", bounced.status);

    // a resolved cheque cannot change again
    match ledger.set_transaction_status(student.id, good.id, ChequeOutcome::Bounced, &time) {
        Ok(_) => println!("unexpected transition"),
        Err(e) => println!("second resolution rejected: {}", e),
    }

    let dues = ledger.dues(student.id)?;
    println!("\noutstanding after clearance: {}", dues.total_outstanding);

    println!("\nevents:");
    for event in ledger.take_events() {
        println!("  {:?}", event);
    }

    Ok(())
}
