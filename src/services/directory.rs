//! Reference rows for the people the workshop deals with. Identity lives with the external
//! issuer; these rows only link a token's `sub` to workshop data.

use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Advertiser, Claims, Customer, Role, Technician, Vehicle};
use crate::services::catalog::require_staff;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub user_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVehicle {
    pub make: String,
    pub model: String,
    pub plate: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTechnician {
    pub user_id: i64,
    pub name: String,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdvertiser {
    pub user_id: i64,
    pub company_name: String,
}

pub fn create_customer(conn: &Connection, actor: &Claims, req: NewCustomer) -> Result<Customer, AppError> {
    require_staff(actor)?;
    require_name(&req.name)?;
    let id = queries::insert_customer(conn, req.user_id, req.name.trim(), req.phone.as_deref(), req.email.as_deref())?;
    tracing::info!(customer = id, user = req.user_id, "customer created");
    queries::get_customer(conn, id)?.ok_or_else(|| AppError::not_found("Customer not found"))
}

pub fn list_customers(conn: &Connection, actor: &Claims) -> Result<Vec<Customer>, AppError> {
    require_staff(actor)?;
    Ok(queries::list_customers(conn)?)
}

pub fn add_vehicle(
    conn: &Connection,
    actor: &Claims,
    customer_id: i64,
    req: NewVehicle,
) -> Result<Vehicle, AppError> {
    ensure_customer_access(actor, customer_id)?;
    queries::get_customer(conn, customer_id)?.ok_or_else(|| AppError::not_found("Customer not found"))?;
    if req.plate.trim().is_empty() {
        return Err(AppError::validation("Vehicle plate is required"));
    }
    let id = queries::insert_vehicle(conn, customer_id, req.make.trim(), req.model.trim(), req.plate.trim())?;
    tracing::info!(vehicle = id, customer = customer_id, "vehicle registered");
    queries::get_vehicle(conn, id)?.ok_or_else(|| AppError::not_found("Vehicle not found"))
}

pub fn list_vehicles(conn: &Connection, actor: &Claims, customer_id: i64) -> Result<Vec<Vehicle>, AppError> {
    ensure_customer_access(actor, customer_id)?;
    Ok(queries::list_vehicles_for_customer(conn, customer_id)?)
}

pub fn create_technician(conn: &Connection, actor: &Claims, req: NewTechnician) -> Result<Technician, AppError> {
    require_staff(actor)?;
    require_name(&req.name)?;
    let id = queries::insert_technician(conn, req.user_id, req.name.trim(), req.specialization.as_deref())?;
    tracing::info!(technician = id, user = req.user_id, "technician created");
    queries::get_technician(conn, id)?.ok_or_else(|| AppError::not_found("Technician not found"))
}

pub fn list_technicians(conn: &Connection, actor: &Claims) -> Result<Vec<Technician>, AppError> {
    require_staff(actor)?;
    Ok(queries::list_technicians(conn)?)
}

pub fn create_advertiser(conn: &Connection, actor: &Claims, req: NewAdvertiser) -> Result<Advertiser, AppError> {
    require_staff(actor)?;
    require_name(&req.company_name)?;
    let id = queries::insert_advertiser(conn, req.user_id, req.company_name.trim())?;
    tracing::info!(advertiser = id, user = req.user_id, "advertiser created");
    queries::get_advertiser(conn, id)?.ok_or_else(|| AppError::not_found("Advertiser not found"))
}

fn ensure_customer_access(actor: &Claims, customer_id: i64) -> Result<(), AppError> {
    match actor.role {
        Role::Manager | Role::Admin => Ok(()),
        Role::Customer if actor.customer_id == Some(customer_id) => Ok(()),
        _ => Err(AppError::forbidden("You do not have access to this customer")),
    }
}

fn require_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    Ok(())
}
