/// quick start - enroll a student and take a payment
use std::sync::Arc;

use fee_ledger_rs::{
    AcademicYear, Enrollment, FeeLedgerService, FeeSchedule, FeeStructureDocument, FeeType,
    LedgerConfig, MemoryStore, Money, School, TransactionRequest,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let year = AcademicYear::parse("24-25")?;

    // a school with one fee structure
    let store = Arc::new(MemoryStore::new());
    store.put_school(
        School::new("SCH01", "Green Valley")
            .with_classes(["1st", "2nd", "3rd"])
            .with_payment_modes(["Cash", "Cheque"])
            .with_accounts(["Main"]),
    )?;

    let mut structure = FeeStructureDocument::new("SCH01");
    let fees = FeeSchedule::new(Money::from_major(1000), Money::from_major(9000));
    structure.set_fee(year, "2nd", "DS", None, fees);
    store.put_fee_structure(structure)?;

    let mut ledger = FeeLedgerService::new(store, LedgerConfig::default(), "SCH01")?;

    // enroll and pay
    let student = ledger.enroll_student_now(Enrollment::new("Aarav", year, "2nd", "DS"))?;
    ledger.record_transaction_now(
        student.id,
        &TransactionRequest::new()
            .academic_year("24-25")
            .payment_mode("Cash")
            .account("Main")
            .date("2024-06-10")
            .fee_type(FeeType::TuitionFee)
            .amount(Money::from_major(2500)),
    )?;

    // print current state
    println!("{}", ledger.json(student.id)?);

    Ok(())
}
