use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::advertisement::CreateAdvertisement;
use crate::models::invoice::round_currency;
use crate::models::{AdStatus, Advertisement, Claims, Invoice, InvoiceOwner, Role};

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAdvertisement {
    pub advertisement: Advertisement,
    pub invoice: Invoice,
}

/// Creates a pending ad and its invoice. Amount is the placement's daily rate over the
/// inclusive run.
pub fn create_advertisement(
    conn: &mut Connection,
    actor: &Claims,
    req: CreateAdvertisement,
    now: NaiveDateTime,
) -> Result<CreatedAdvertisement, AppError> {
    let advertiser_id = match actor.role {
        Role::Advertiser => actor
            .advertiser_id
            .ok_or_else(|| AppError::forbidden("Token carries no advertiser profile"))?,
        Role::Manager | Role::Admin => req
            .advertiser_id
            .ok_or_else(|| AppError::validation("Missing required fields: advertiserId"))?,
        _ => return Err(AppError::forbidden("Only advertisers and staff can create advertisements")),
    };

    let (Some(title), Some(placement_id), Some(start_date), Some(end_date)) =
        (req.title, req.placement_id, req.start_date, req.end_date)
    else {
        return Err(AppError::validation(
            "Missing required fields: title, placementId, startDate, endDate",
        ));
    };
    if start_date > end_date {
        return Err(AppError::validation("startDate must not be after endDate"));
    }

    let tx = conn.transaction()?;

    queries::get_advertiser(&tx, advertiser_id)?.ok_or_else(|| AppError::not_found("Advertiser not found"))?;
    let placement = queries::get_placement(&tx, placement_id)?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::not_found("Placement not found or inactive"))?;

    let mut advertisement = Advertisement {
        id: 0,
        title,
        content: req.content,
        image_url: req.image_url,
        advertiser_id,
        placement_id,
        start_date,
        end_date,
        status: AdStatus::Pending,
        impressions: 0,
        clicks: 0,
        created_at: now,
    };
    advertisement.id = queries::insert_advertisement(&tx, &advertisement)?;

    let amount = round_currency(placement.daily_rate * advertisement.billed_days() as f64);
    let invoice_id = queries::insert_invoice(&tx, InvoiceOwner::Advertisement(advertisement.id), amount, &now)?;
    let invoice = queries::get_invoice(&tx, invoice_id)?.ok_or_else(|| anyhow::anyhow!("invoice {invoice_id} vanished"))?;

    tx.commit()?;

    tracing::info!(
        advertisement = advertisement.id,
        advertiser = advertiser_id,
        days = advertisement.billed_days(),
        amount,
        "advertisement created"
    );
    Ok(CreatedAdvertisement {
        advertisement,
        invoice,
    })
}

pub fn list_advertisements(
    conn: &Connection,
    actor: &Claims,
    status: Option<&str>,
) -> Result<Vec<Advertisement>, AppError> {
    let status = status.map(parse_status).transpose()?;
    let advertiser_id = match actor.role {
        Role::Manager | Role::Admin => None,
        Role::Advertiser => Some(own_advertiser_id(actor)?),
        _ => return Err(AppError::forbidden("Only advertisers and staff can list advertisements")),
    };
    Ok(queries::list_advertisements(conn, advertiser_id, status)?)
}

pub fn get_advertisement(conn: &Connection, actor: &Claims, id: i64) -> Result<Advertisement, AppError> {
    let ad = load(conn, id)?;
    ensure_owner_or_staff(actor, &ad)?;
    Ok(ad)
}

pub fn update_status(
    conn: &mut Connection,
    actor: &Claims,
    id: i64,
    status: Option<&str>,
) -> Result<Advertisement, AppError> {
    let next = parse_status(status.ok_or_else(|| AppError::validation("Missing required fields: status"))?)?;

    let tx = conn.transaction()?;
    let mut ad = load(&tx, id)?;
    ensure_owner_or_staff(actor, &ad)?;

    if !ad.status.can_transition(next, actor.role) {
        return Err(AppError::validation(format!(
            "Advertisement cannot move from {} to {}",
            ad.status.as_str(),
            next.as_str()
        )));
    }
    if !queries::transition_ad_status(&tx, id, ad.status, next)? {
        return Err(AppError::validation("Advertisement status changed concurrently"));
    }
    tx.commit()?;

    tracing::info!(advertisement = id, from = ad.status.as_str(), to = next.as_str(), "advertisement status updated");
    ad.status = next;
    Ok(ad)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engagement {
    Impression,
    Click,
}

/// Counts an impression or click. Only active ads are counted.
pub fn record_engagement(conn: &Connection, id: i64, kind: Engagement) -> Result<Advertisement, AppError> {
    let ad = load(conn, id)?;
    if !queries::increment_ad_counter(conn, id, kind == Engagement::Click)? {
        return Err(AppError::validation(format!(
            "Advertisement is {}, not active",
            ad.status.as_str()
        )));
    }
    tracing::debug!(advertisement = id, ?kind, "engagement recorded");
    load(conn, id)
}

fn ensure_owner_or_staff(actor: &Claims, ad: &Advertisement) -> Result<(), AppError> {
    match actor.role {
        Role::Manager | Role::Admin => Ok(()),
        Role::Advertiser if actor.advertiser_id == Some(ad.advertiser_id) => Ok(()),
        _ => Err(AppError::forbidden("You do not have access to this advertisement")),
    }
}

fn own_advertiser_id(actor: &Claims) -> Result<i64, AppError> {
    actor
        .advertiser_id
        .ok_or_else(|| AppError::forbidden("Token carries no advertiser profile"))
}

fn parse_status(s: &str) -> Result<AdStatus, AppError> {
    AdStatus::parse(s).ok_or_else(|| AppError::validation(format!("Invalid advertisement status: {s}")))
}

fn load(conn: &Connection, id: i64) -> Result<Advertisement, AppError> {
    queries::get_advertisement(conn, id)?.ok_or_else(|| AppError::not_found("Advertisement not found"))
}
