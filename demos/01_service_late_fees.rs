/// service late fees - grace periods and live fee assessment under a test clock
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use obligation_schedule_rs::{
    BillingFrequency, EngineConfig, LateFeePolicy, Money, ObligationEngine, Rate,
    SafeTimeProvider, ServiceBuilder, ServiceId, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== service late fee example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();
    let engine = ObligationEngine::in_memory(EngineConfig::default())?;

    // monthly lease due on the 10th, 5% late fee after 3 days of grace
    let new_service = ServiceBuilder::new()
        .name("warehouse lease")
        .frequency(BillingFrequency::Monthly)
        .amount(Money::from_major(1_000))
        .start_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .due_day(10)
        .periods(4)
        .late_fee(LateFeePolicy::Percentage {
            rate: Rate::from_percentage(5),
            grace_days: 3,
        })
        .build()?;
    let service = engine.create_service(new_service, &time)?;
    println!("service {} created with {} periods", service.id, service.terms.periods);

    // inside the grace period no fee is charged
    controller.advance(Duration::days(11));
    print_periods(&engine, service.id, &time)?;

    // past grace the fee shows up on read
    controller.advance(Duration::days(10));
    print_periods(&engine, service.id, &time)?;

    // paying only the base amount leaves the period partial
    let detail = engine.service_detail(service.id, &time)?;
    let first = &detail.periods[0];
    let today = time.now().date_naive();
    let payment = engine.payments().record(first.entry.expected_amount, today, None);
    let view = engine.apply_service_payment(
        first.entry.id,
        payment.id,
        first.entry.expected_amount,
        today,
        &time,
    )?;
    println!("\nbase amount paid -> {:?}", view.entry.status);

    // unlink it and pay the effective amount instead
    engine.unlink_service_payment(first.entry.id, &time)?;
    let payment = engine.payments().record(view.effective_amount, today, None);
    let view = engine.apply_service_payment(
        first.entry.id,
        payment.id,
        view.effective_amount,
        today,
        &time,
    )?;
    println!("effective amount paid -> {:?}", view.entry.status);

    // skip the last period
    if let Some(last) = detail.periods.last() {
        engine.skip_service_period(last.entry.id, Some("tenant away".to_string()), &time)?;
    }

    let detail = engine.service_detail(service.id, &time)?;
    println!("\n{}", detail.to_json_pretty()?);

    Ok(())
}

fn print_periods(
    engine: &ObligationEngine,
    service_id: ServiceId,
    time: &SafeTimeProvider,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("\nas of {}:", time.now().format("%Y-%m-%d"));
    let detail = engine.service_detail(service_id, time)?;
    for period in &detail.periods {
        println!(
            "  {} due {} base ${} fee ${} ({} days overdue) {:?}",
            period.entry.period_start,
            period.entry.due_date,
            period.entry.expected_amount,
            period.late_fee,
            period.overdue_days,
            period.entry.status
        );
    }
    Ok(())
}
