/// loan lifecycle - schedule, payments, overdue promotion and regeneration
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use obligation_schedule_rs::{
    EngineConfig, LoanBuilder, LoanFrequency, LoanTermsOverride, Money, ObligationEngine, Rate,
    SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== loan lifecycle example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();
    let engine = ObligationEngine::in_memory(EngineConfig::default())?;

    // 12,000 at 6% over 6 monthly installments
    let new_loan = LoanBuilder::new()
        .title("delivery van")
        .principal(Money::from_major(12_000))
        .rate(Rate::from_percentage(6))
        .installments(6)
        .frequency(LoanFrequency::Monthly)
        .start_date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        .build()?;
    let loan = engine.create_loan(new_loan, &time)?;
    println!("loan {} created, status {:?}", loan.id, loan.status);

    let schedule = engine.loan_schedule(loan.id)?;
    for entry in &schedule {
        println!(
            "  #{} due {} amount ${} (principal ${}, interest ${})",
            entry.installment_number,
            entry.due_date,
            entry.expected_amount,
            entry.expected_principal,
            entry.expected_interest
        );
    }

    // pay the first two installments on time
    for entry in schedule.iter().take(2) {
        let payment = engine
            .payments()
            .record(entry.expected_amount, entry.due_date, Some("bank transfer".to_string()));
        let view = engine.apply_loan_payment(
            entry.id,
            payment.id,
            entry.expected_amount,
            entry.due_date,
            &time,
        )?;
        println!("installment #{} -> {:?}", view.entry.installment_number, view.entry.status);
    }

    // miss the third; reading the detail promotes it to overdue
    controller.advance(Duration::days(100));
    println!("\nadvanced to: {}", time.now().format("%Y-%m-%d"));
    let detail = engine.loan_detail(loan.id, &time)?;
    println!("status: {:?}", detail.loan.status);
    println!("outstanding: ${}", detail.totals.outstanding);

    // settle it late, then stretch the remainder over more installments
    let third = &schedule[2];
    let late = time.now().date_naive();
    let payment = engine.payments().record(third.expected_amount, late, None);
    engine.apply_loan_payment(third.id, payment.id, third.expected_amount, late, &time)?;
    println!("late payment applied, status: {:?}", engine.loan_detail(loan.id, &time)?.loan.status);

    let overrides = LoanTermsOverride {
        installments: Some(12),
        ..LoanTermsOverride::default()
    };
    let regenerated = engine.regenerate_loan_schedule(loan.id, &overrides, &time)?;
    println!("\nschedule regenerated with {} installments", regenerated.len());

    for event in engine.take_events() {
        println!("event: {:?}", event);
    }

    Ok(())
}
