//! # Party Repository
//!
//! Companies and their employees.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use tally_core::{Company, Employee};

#[derive(Debug, sqlx::FromRow)]
struct CompanyRow {
    id: String,
    name: String,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Company {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EmployeeRow {
    id: String,
    name: String,
    contact_handle: String,
    company_id: String,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            id: row.id,
            name: row.name,
            contact_handle: row.contact_handle,
            company_id: row.company_id,
        }
    }
}

/// Repository for company and employee reads.
#[derive(Debug, Clone)]
pub struct PartyRepository {
    pool: SqlitePool,
}

impl PartyRepository {
    /// Creates a new PartyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PartyRepository { pool }
    }

    pub async fn get_company(&self, id: &str) -> DbResult<Option<Company>> {
        let row = sqlx::query_as::<_, CompanyRow>("SELECT id, name FROM companies WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Company::from))
    }

    pub async fn list_companies(&self) -> DbResult<Vec<Company>> {
        let rows =
            sqlx::query_as::<_, CompanyRow>("SELECT id, name FROM companies ORDER BY name, id")
                .fetch_all(&self.pool)
                .await?;
        debug!(count = rows.len(), "Listed companies");
        Ok(rows.into_iter().map(Company::from).collect())
    }

    pub async fn get_employee(&self, id: &str) -> DbResult<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            "SELECT id, name, contact_handle, company_id FROM employees WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Employee::from))
    }

    pub async fn list_employees(&self) -> DbResult<Vec<Employee>> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            "SELECT id, name, contact_handle, company_id FROM employees ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        debug!(count = rows.len(), "Listed employees");
        Ok(rows.into_iter().map(Employee::from).collect())
    }

    /// Number of employees attached to a company.
    pub async fn count_employees_of(&self, company_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE company_id = ?1")
            .bind(company_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
