use chrono::{DateTime, Utc};
use hourglass_rs::{SafeTimeProvider, TimeSource};
use tracing::{info, instrument, warn};

use crate::config::LedgerConfig;
use crate::decimal::Money;
use crate::enrollment::Enrollment;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::fee_structure::{FeeLookup, FeeStructureDocument, FeeStructureLookup, LookupOutcome};
use crate::ledger::{DuesReport, Receipt, Transaction, TransactionRequest, TransactionValidator};
use crate::promotion::{BatchProgress, BatchPromotionResult, PromotionPlan, PromotionSummary};
use crate::school::School;
use crate::state::{LedgerSnapshot, TuitionFees};
use crate::store::{LedgerStore, Versioned};
use crate::student::Student;
use crate::types::{ChequeOutcome, ReceiptCounter, StudentId, TransactionId};
use crate::views::StudentLedgerView;

/// fee ledger operations for one active school
pub struct FeeLedgerService<S: LedgerStore> {
    store: S,
    pub config: LedgerConfig,
    school_code: String,
    pub events: EventStore,
    pub snapshots: Vec<LedgerSnapshot>,
}

impl<S: LedgerStore> FeeLedgerService<S> {
    /// open the ledger of `school_code`
    pub fn new(store: S, config: LedgerConfig, school_code: impl Into<String>) -> Result<Self> {
        config.validate()?;
        let school_code = school_code.into();
        store.load_school(&school_code)?;

        Ok(Self {
            store,
            config,
            school_code,
            events: EventStore::new(),
            snapshots: Vec::new(),
        })
    }

    pub fn school_code(&self) -> &str {
        &self.school_code
    }

    /// change the active school
    pub fn switch_school(&mut self, school_code: impl Into<String>) -> Result<()> {
        let school_code = school_code.into();
        self.store.load_school(&school_code)?;
        info!(from = %self.school_code, to = %school_code, "active school switched");
        self.school_code = school_code;
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn school(&self) -> Result<School> {
        self.store.load_school(&self.school_code)
    }

    /// load a student of the active school
    pub fn load_student(&self, student_id: StudentId) -> Result<Versioned<Student>> {
        let student = self.store.load_student(student_id)?;
        if student.value.school_code != self.school_code {
            return Err(LedgerError::StudentNotFound { id: student_id });
        }
        Ok(student)
    }

    pub fn dues(&self, student_id: StudentId) -> Result<DuesReport> {
        Ok(self.load_student(student_id)?.value.dues())
    }

    pub fn view(&self, student_id: StudentId) -> Result<StudentLedgerView> {
        Ok(StudentLedgerView::from_student(&self.load_student(student_id)?.value))
    }

    /// get json representation of a student's ledger
    pub fn to_json_pretty(&self, student_id: StudentId) -> Result<String> {
        Ok(self.view(student_id)?.to_json_pretty()?)
    }

    /// short alias for json output
    pub fn json(&self, student_id: StudentId) -> Result<String> {
        self.to_json_pretty(student_id)
    }

    /// enroll with system time
    pub fn enroll_student_now(&mut self, enrollment: Enrollment) -> Result<Student> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.enroll_student(enrollment, &time)
    }

    /// add a student; the fee id comes from the school's counter
    #[instrument(skip_all, fields(school_code = %self.school_code, class = %enrollment.class))]
    pub fn enroll_student(
        &mut self,
        enrollment: Enrollment,
        time_provider: &SafeTimeProvider,
    ) -> Result<Student> {
        let now = time_provider.now();
        let school = self.school()?;
        enrollment.validate(&school)?;

        let document = self.store.fee_structure(&self.school_code)?;
        let fee_id = self.store.next_counter_value(&self.school_code, ReceiptCounter::FeeId)?;

        let (student, fees) = {
            let baseline = &self.config.baseline_student_type;
            let lookup = FeeStructureLookup::new(document.as_ref(), baseline);
            enrollment.into_student(&self.school_code, fee_id, &lookup)
        };
        self.note_lookup(&fees, now);

        self.store.insert_student(student.clone())?;
        info!(
            student_id = %student.id,
            fee_id,
            total = %student.all_fee.tuition_fees.total(),
            "student enrolled"
        );

        self.events.emit(Event::StudentEnrolled {
            student_id: student.id,
            fee_id,
            academic_year: student.academic_year,
            class: student.class.clone(),
            timestamp: now,
        });
        self.capture(&student, "enrollment".to_string(), now);

        Ok(student)
    }

    /// record a payment with system time
    pub fn record_transaction_now(
        &mut self,
        student_id: StudentId,
        request: &TransactionRequest,
    ) -> Result<Transaction> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.record_transaction(student_id, request, &time)
    }

    /// validate and store a payment
    ///
    /// Cash-like payments take the next receipt number and complete at once;
    /// cheques get a temporary id and wait in `pending`.
    #[instrument(skip_all, fields(school_code = %self.school_code, student_id = %student_id))]
    pub fn record_transaction(
        &mut self,
        student_id: StudentId,
        request: &TransactionRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<Transaction> {
        let now = time_provider.now();
        let school = self.school()?;
        let Versioned { value: mut student, version } = self.load_student(student_id)?;

        let validator = TransactionValidator::new(&self.config);
        let payment = match validator.validate(request, &student, &school) {
            Ok(payment) => payment,
            Err(e) => {
                warn!(error = %e, "transaction rejected");
                return Err(e);
            }
        };

        let receipt = if payment.is_cheque {
            Receipt::temporary_for(student.fee_id)
        } else {
            let counter = payment.fee_type.receipt_counter();
            Receipt::Issued(self.store.next_counter_value(&self.school_code, counter)?)
        };

        let transaction = student.post(Transaction::from_payment(payment, receipt, now)).clone();
        self.store.update_student(&student, version)?;

        info!(
            transaction_id = %transaction.id,
            fee_type = %transaction.fee_type,
            amount = %transaction.amount,
            receipt_id = ?transaction.receipt_id,
            temp_receipt_id = ?transaction.temp_receipt_id,
            "transaction recorded"
        );

        self.events.emit(Event::TransactionRecorded {
            student_id,
            transaction_id: transaction.id,
            fee_type: transaction.fee_type,
            amount: transaction.amount,
            receipt_id: transaction.receipt_id,
            temp_receipt_id: transaction.temp_receipt_id.clone(),
            status: transaction.status,
            timestamp: now,
        });
        self.capture(
            &student,
            format!("{} payment: {}", transaction.fee_type, transaction.amount),
            now,
        );

        Ok(transaction)
    }

    /// resolve a pending cheque
    #[instrument(
        skip_all,
        fields(
            school_code = %self.school_code,
            student_id = %student_id,
            transaction_id = %transaction_id
        )
    )]
    pub fn set_transaction_status(
        &mut self,
        student_id: StudentId,
        transaction_id: TransactionId,
        outcome: ChequeOutcome,
        time_provider: &SafeTimeProvider,
    ) -> Result<Transaction> {
        let now = time_provider.now();
        let Versioned { value: mut student, version } = self.load_student(student_id)?;

        // check before a receipt number is spent
        let current = student.transaction(transaction_id)?;
        if current.status.is_terminal() {
            warn!(status = ?current.status, ?outcome, "cheque already resolved");
            return Err(LedgerError::InvalidStatusTransition {
                current: current.status,
                requested: outcome,
            });
        }
        let counter = current.fee_type.receipt_counter();

        let event = match outcome {
            ChequeOutcome::Cleared => {
                // payments completed since the cheque was taken count against it
                let validator = TransactionValidator::new(&self.config);
                if let Err(e) = validator.validate_clearance(current, &student) {
                    warn!(error = %e, "cheque clearance rejected");
                    return Err(e);
                }
                let receipt_id = self.store.next_counter_value(&self.school_code, counter)?;
                let settled = student.clear_cheque(transaction_id, receipt_id)?;
                info!(receipt_id, settled = %settled, "cheque cleared");
                Event::ChequeCleared {
                    student_id,
                    transaction_id,
                    receipt_id,
                    settled_previous_year: settled,
                    timestamp: now,
                }
            }
            ChequeOutcome::Bounced => {
                student.reject_cheque(transaction_id)?;
                info!("cheque rejected");
                Event::ChequeRejected {
                    student_id,
                    transaction_id,
                    timestamp: now,
                }
            }
        };

        self.store.update_student(&student, version)?;
        self.events.emit(event);
        self.capture(&student, format!("cheque {:?}", outcome).to_lowercase(), now);

        student.transaction(transaction_id).cloned()
    }

    /// remove a transaction; counters and carried balances are not reversed
    #[instrument(
        skip_all,
        fields(
            school_code = %self.school_code,
            student_id = %student_id,
            transaction_id = %transaction_id
        )
    )]
    pub fn delete_transaction(
        &mut self,
        student_id: StudentId,
        transaction_id: TransactionId,
        time_provider: &SafeTimeProvider,
    ) -> Result<Transaction> {
        let now = time_provider.now();
        let Versioned { value: mut student, version } = self.load_student(student_id)?;

        let removed = student.remove_transaction(transaction_id)?;
        self.store.update_student(&student, version)?;
        info!(amount = %removed.amount, status = ?removed.status, "transaction deleted");

        self.events.emit(Event::TransactionDeleted {
            student_id,
            transaction_id,
            fee_type: removed.fee_type,
            amount: removed.amount,
            status: removed.status,
            timestamp: now,
        });
        self.capture(&student, "transaction deleted".to_string(), now);

        Ok(removed)
    }

    /// promote with system time
    pub fn promote_student_now(&mut self, student_id: StudentId) -> Result<PromotionSummary> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.promote_student(student_id, &time)
    }

    /// move a student into the next class and academic year
    #[instrument(skip_all, fields(school_code = %self.school_code, student_id = %student_id))]
    pub fn promote_student(
        &mut self,
        student_id: StudentId,
        time_provider: &SafeTimeProvider,
    ) -> Result<PromotionSummary> {
        let school = self.school()?;
        let document = self.store.fee_structure(&self.school_code)?;
        self.promote_with(student_id, &school, document.as_ref(), time_provider.now())
    }

    /// promote many students one after another
    ///
    /// A failure is recorded and the batch moves on; students already
    /// promoted stay promoted.
    #[instrument(skip_all, fields(school_code = %self.school_code, total = student_ids.len()))]
    pub fn promote_students<F>(
        &mut self,
        student_ids: &[StudentId],
        time_provider: &SafeTimeProvider,
        mut progress: F,
    ) -> Result<BatchPromotionResult>
    where
        F: FnMut(BatchProgress),
    {
        let school = self.school()?;
        let document = self.store.fee_structure(&self.school_code)?;
        let total = student_ids.len();
        let mut result = BatchPromotionResult::default();

        for &student_id in student_ids {
            let outcome =
                self.promote_with(student_id, &school, document.as_ref(), time_provider.now());
            result.processed += 1;

            let succeeded = outcome.is_ok();
            match outcome {
                Ok(summary) => result.promoted.push(summary),
                Err(e) => {
                    warn!(
                        student_id = %student_id,
                        error = %e,
                        "promotion failed, continuing batch"
                    );
                    result.failures.push((student_id, e));
                }
            }

            progress(BatchProgress {
                processed: result.processed,
                total,
                student_id,
                succeeded,
            });
        }

        info!(
            promoted = result.promoted.len(),
            failed = result.failures.len(),
            "batch promotion finished"
        );
        Ok(result)
    }

    fn promote_with(
        &mut self,
        student_id: StudentId,
        school: &School,
        document: Option<&FeeStructureDocument>,
        now: DateTime<Utc>,
    ) -> Result<PromotionSummary> {
        let Versioned { value: mut student, version } = self.load_student(student_id)?;

        let plan = {
            let lookup = FeeStructureLookup::new(document, &self.config.baseline_student_type);
            PromotionPlan::prepare(&student, school, &lookup)?
        };
        self.note_lookup(&plan.fee_lookup, now);

        plan.apply(&mut student);
        let version = self.store.update_student(&student, version)?;

        info!(
            student_id = %student_id,
            from_year = %plan.from_year,
            to_year = %plan.to_year,
            to_class = %plan.to_class,
            rolled_to_balance = %plan.rollover.to_balance(),
            rolled_to_bus = %plan.rollover.bus,
            "student promoted"
        );

        self.events.emit(Event::StudentPromoted {
            student_id,
            from_year: plan.from_year,
            to_year: plan.to_year,
            from_class: plan.from_class.clone(),
            to_class: plan.to_class.clone(),
            new_status: plan.new_status,
            rolled_to_balance: plan.rollover.to_balance(),
            rolled_to_bus: plan.rollover.bus,
            timestamp: now,
        });
        self.capture(&student, format!("promotion: {} -> {}", plan.from_year, plan.to_year), now);

        Ok(PromotionSummary {
            student_id,
            from_year: plan.from_year,
            to_year: plan.to_year,
            from_class: plan.from_class,
            to_class: plan.to_class,
            new_status: plan.new_status,
            rollover: plan.rollover,
            version,
        })
    }

    /// set the tuition discount against the baseline fee of the student's class
    ///
    /// The net fee becomes baseline minus discount; the admission fee is kept
    /// and the tuition fee absorbs the change.
    #[instrument(
        skip_all,
        fields(school_code = %self.school_code, student_id = %student_id, discount = %discount)
    )]
    pub fn update_tuition_discount(
        &mut self,
        student_id: StudentId,
        discount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<TuitionFees> {
        let now = time_provider.now();
        let document = self.store.fee_structure(&self.school_code)?;
        let Versioned { value: mut student, version } = self.load_student(student_id)?;

        let baseline_lookup =
            FeeStructureLookup::new(document.as_ref(), &self.config.baseline_student_type)
                .baseline_for(&student.class, student.academic_year, student.english_medium);
        self.note_lookup(&baseline_lookup, now);

        let baseline = if student.status.charges_admission() {
            baseline_lookup.fees
        } else {
            baseline_lookup.fees.without_admission()
        };

        if discount.is_negative() || discount > baseline.total() {
            warn!(baseline = %baseline.total(), "discount rejected");
            return Err(LedgerError::InvalidDiscount {
                discount,
                baseline: baseline.total(),
            });
        }

        let old_discount = student.all_fee.tuition_fees_discount;
        let net = baseline.total() - discount;
        let admission_fee = student.all_fee.tuition_fees.admission_fee().min(net);
        student.all_fee.set_tuition_fees(admission_fee, net - admission_fee);
        student.all_fee.tuition_fees_discount = discount;

        self.store.update_student(&student, version)?;
        let fees = student.all_fee.tuition_fees;
        info!(old_discount = %old_discount, total = %fees.total(), "tuition discount updated");

        self.events.emit(Event::DiscountUpdated {
            student_id,
            old_discount,
            new_discount: discount,
            new_total: fees.total(),
            timestamp: now,
        });
        self.capture(&student, format!("discount: {}", discount), now);

        Ok(fees)
    }

    /// set the bus fee from its undiscounted amount and a discount
    #[instrument(skip_all, fields(school_code = %self.school_code, student_id = %student_id))]
    pub fn update_bus_fee(
        &mut self,
        student_id: StudentId,
        base: Money,
        discount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<Money> {
        let now = time_provider.now();
        if base.is_negative() {
            return Err(LedgerError::InvalidFeeAmount { field: "busFee", amount: base });
        }
        if discount.is_negative() || discount > base {
            return Err(LedgerError::InvalidDiscount { discount, baseline: base });
        }

        let Versioned { value: mut student, version } = self.load_student(student_id)?;
        student.all_fee.bus_fee = base - discount;
        student.all_fee.bus_fee_discount = discount;
        self.store.update_student(&student, version)?;
        info!(bus_fee = %student.all_fee.bus_fee, discount = %discount, "bus fee updated");

        self.events.emit(Event::BusFeeUpdated {
            student_id,
            bus_fee: student.all_fee.bus_fee,
            discount,
            timestamp: now,
        });
        self.capture(&student, "bus fee".to_string(), now);

        Ok(student.all_fee.bus_fee)
    }

    /// overwrite mess and hostel fees
    #[instrument(skip_all, fields(school_code = %self.school_code, student_id = %student_id))]
    pub fn set_boarding_fees(
        &mut self,
        student_id: StudentId,
        mess_fee: Money,
        hostel_fee: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time_provider.now();
        for (field, amount) in [("messFee", mess_fee), ("hostelFee", hostel_fee)] {
            if amount.is_negative() {
                return Err(LedgerError::InvalidFeeAmount { field, amount });
            }
        }

        let Versioned { value: mut student, version } = self.load_student(student_id)?;
        student.all_fee.mess_fee = mess_fee;
        student.all_fee.hostel_fee = hostel_fee;
        self.store.update_student(&student, version)?;
        info!(mess_fee = %mess_fee, hostel_fee = %hostel_fee, "boarding fees updated");

        self.events.emit(Event::BoardingFeesUpdated {
            student_id,
            mess_fee,
            hostel_fee,
            timestamp: now,
        });
        self.capture(&student, "boarding fees".to_string(), now);

        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    pub fn snapshots(&self) -> &[LedgerSnapshot] {
        &self.snapshots
    }

    fn note_lookup(&mut self, lookup: &FeeLookup, now: DateTime<Utc>) {
        if let LookupOutcome::YearFallback { requested, used } = lookup.outcome {
            self.events.emit(Event::FeeStructureFallback {
                school_code: self.school_code.clone(),
                requested_year: requested,
                used_year: used,
                timestamp: now,
            });
        }
    }

    fn capture(&mut self, student: &Student, trigger: String, now: DateTime<Utc>) {
        self.snapshots
            .push(LedgerSnapshot::capture(student.id, &student.all_fee, trigger, now));
    }
}
