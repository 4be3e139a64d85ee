/// year rollover - promote a class and carry unpaid fees forward
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use fee_ledger_rs::{
    AcademicYear, Enrollment, FeeLedgerService, FeeSchedule, FeeStructureDocument, FeeType,
    LedgerConfig, MemoryStore, Money, SafeTimeProvider, School, TimeSource, TransactionRequest,
    YearRelation,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== year rollover ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 3, 31, 18, 0, 0).unwrap()
    ));
    let this_year = AcademicYear::parse("24-25")?;
    let next_year = this_year.next();

    let store = Arc::new(MemoryStore::new());
    store.put_school(
        School::new("SCH01", "Green Valley")
            .with_classes(["1st", "2nd", "3rd"])
            .with_payment_modes(["Cash"])
            .with_accounts(["Main"]),
    )?;

    let mut structure = FeeStructureDocument::new("SCH01");
    let fees = |tuition| FeeSchedule::new(Money::from_major(1000), Money::from_major(tuition));
    structure
        .set_fee(this_year, "2nd", "DS", None, fees(9000))
        .set_fee(this_year, "2nd", "DSS", None, fees(7000))
        .set_fee(this_year, "3rd", "DS", None, fees(10_000))
        .set_fee(next_year, "3rd", "DS", None, fees(11_000))
        .set_fee(next_year, "3rd", "DSS", None, fees(8500));
    store.put_fee_structure(structure)?;

    let mut ledger = FeeLedgerService::new(store, LedgerConfig::default(), "SCH01")?;

    let partly_paid = ledger.enroll_student(
        Enrollment::new("Rohan", this_year, "2nd", "DS").bus(Money::from_major(3000), Money::ZERO),
        &time,
    )?;
    let scholarship =
        ledger.enroll_student(Enrollment::new("Meher", this_year, "2nd", "DSS"), &time)?;
    let final_year = ledger.enroll_student(Enrollment::new("Tara", this_year, "3rd", "DS"), &time)?;

    ledger.record_transaction(
        partly_paid.id,
        &TransactionRequest::new()
            .academic_year("24-25")
            .payment_mode("Cash")
            .account("Main")
            .date("2024-11-15")
            .fee_type(FeeType::TuitionFee)
            .amount(Money::from_major(6000)),
        &time,
    )?;

    let ids = [partly_paid.id, scholarship.id, final_year.id];
    let result = ledger.promote_students(&ids, &time, |progress| {
        println!(
            "[{}/{}] {} {}",
            progress.processed,
            progress.total,
            progress.student_id,
            if progress.succeeded { "promoted" } else { "skipped" }
        );
    })?;

    println!();
    for summary in &result.promoted {
        println!(
            "{}: {} {} -> {} {}, carried {} tuition/boarding and {} bus",
            summary.student_id,
            summary.from_class,
            summary.from_year,
            summary.to_class,
            summary.to_year,
            summary.rollover.to_balance(),
            summary.rollover.bus,
        );
    }
    for (student_id, error) in &result.failures {
        println!("{}: {}", student_id, error);
    }

    let dues = ledger.dues(partly_paid.id)?;
    if let Some(line) = dues.line(FeeType::TuitionFee, YearRelation::Previous) {
        println!("\nprevious-year tuition still due: {}", line.remaining);
    }
    println!("total outstanding: {}", dues.total_outstanding);

    Ok(())
}
