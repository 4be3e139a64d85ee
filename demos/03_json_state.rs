/// json state - ledger views for debugging and support
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use fee_ledger_rs::{
    AcademicYear, ChequeOutcome, Enrollment, FeeLedgerService, FeeSchedule, FeeStructureDocument,
    FeeType, LedgerConfig, MemoryStore, Money, SafeTimeProvider, School, TimeSource,
    TransactionRequest,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== json state serialization ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();
    let year = AcademicYear::parse("24-25")?;

    let store = Arc::new(MemoryStore::new());
    store.put_school(
        School::new("SCH01", "Green Valley")
            .with_classes(["1st", "2nd"])
            .with_payment_modes(["Cash", "Cheque", "UPI"])
            .with_accounts(["Main", "Transport"]),
    )?;
    let mut structure = FeeStructureDocument::new("SCH01");
    let fees = FeeSchedule::new(Money::from_major(1000), Money::from_major(8000));
    structure.set_fee(year, "1st", "DS", None, fees);
    store.put_fee_structure(structure)?;

    let mut ledger = FeeLedgerService::new(store, LedgerConfig::default(), "SCH01")?;

    // stage 1: enrolled
    let student = ledger.enroll_student(
        Enrollment::new("Kabir", year, "1st", "DS")
            .bus(Money::from_major(2400), Money::from_major(400))
            .boarding(Money::from_major(1500), Money::ZERO),
        &time,
    )?;
    println!("stage 1: enrolled");
    println!("-----------------");
    println!("{}\n", ledger.json(student.id)?);

    // stage 2: admission fee and a bus cheque
    let payment = |fee_type, mode: &str, amount| {
        TransactionRequest::new()
            .academic_year("24-25")
            .payment_mode(mode)
            .account("Main")
            .date("2024-06-01")
            .fee_type(fee_type)
            .amount(Money::from_major(amount))
    };
    ledger.record_transaction(student.id, &payment(FeeType::AdmissionFee, "Cash", 1000), &time)?;
    let bus_cheque = payment(FeeType::BusFee, "Cheque", 1000);
    let cheque = ledger.record_transaction(student.id, &bus_cheque, &time)?;
    println!("stage 2: admission paid, bus cheque pending");
    println!("--------------------------------------------");
    println!("{}\n", ledger.json(student.id)?);

    // stage 3: cheque clears a week later
    controller.advance(Duration::days(7));
    ledger.set_transaction_status(student.id, cheque.id, ChequeOutcome::Cleared, &time)?;
    println!("stage 3: cheque cleared");
    println!("-----------------------");
    println!("{}\n", ledger.json(student.id)?);

    println!("audit trail:");
    for snapshot in ledger.snapshots() {
        println!("  {} {}", snapshot.timestamp.format("%Y-%m-%d"), snapshot.trigger);
    }

    Ok(())
}
