use std::sync::Arc;

use studio_crm::{
    appointments::AppointmentService,
    config::Config,
    gateway::Gateway,
    inquiries::Intake,
    models::AppointmentStatus,
    notify::{Notification, NotificationBus},
    reference::ReferenceData,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let Some(mobile) = std::env::args().nth(1) else {
        anyhow::bail!("Usage: frontdesk <mobile>");
    };

    let cfg = Config::from_env()?;
    let bus = NotificationBus::new();
    bus.subscribe(Arc::new(|n: &Notification| eprintln!("[{}] {}", n.title, n.message)));
    let gateway = Gateway::http(&cfg, bus)?;

    let reference = ReferenceData::load(&gateway).await?;
    let intake = Intake::new(gateway.clone()).with_reference(reference.clone());
    let Some((resolution, draft)) = intake.start(&mobile).await? else {
        println!("The backend returned no client for {mobile}");
        return Ok(());
    };
    let client = &resolution.client;

    let status = client.current_status.map_or("-", |s| s.label());
    println!("Client #{}: {} ({status})", client.id, client.display_name());
    match &resolution.latest_inquiry {
        Some(inquiry) => {
            let size = draft
                .tattoo_size_id
                .and_then(|id| reference.tattoo_size(id))
                .map_or("-", |e| e.label.as_str());
            let source = draft
                .reference_type_id
                .and_then(|id| reference.reference_type(id))
                .map_or("-", |e| e.label.as_str());
            println!("Latest inquiry #{} on {}", inquiry.id, inquiry.created_at.format("%d %b %Y"));
            println!("  size: {size}  reference: {source}");
            println!("  intent: {}", draft.intent);
            if !draft.remark.is_empty() {
                println!("  remark: {}", draft.remark);
            }
        }
        None => println!("No inquiries yet"),
    }

    let appointments = AppointmentService::new(gateway)
        .with_reference(reference)
        .list_by_client(client.id)
        .await?;
    for appt in &appointments {
        println!(
            "Appointment #{} {} {}",
            appt.id,
            appt.appointment_at.format("%d %b %Y %H:%M UTC"),
            badge(appt.appointment_status)
        );
    }
    Ok(())
}

/// Status badge in the terminal colour matching the list screen.
fn badge(status: Option<AppointmentStatus>) -> String {
    let Some(status) = status else {
        return "[unknown]".to_string();
    };
    let ansi = match status.color() {
        "success" => "32",
        "error" => "31",
        "secondary" => "36",
        _ => "2",
    };
    format!("\x1b[{ansi}m[{}]\x1b[0m", status.label())
}
