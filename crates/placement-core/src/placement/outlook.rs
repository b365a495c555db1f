use std::sync::Arc;

use tracing::info;

use super::clock::Clock;
use super::domain::{ExpectedCompany, ExpectedCompanyDraft, ExpectedCompanyId, VisitStatus};
use super::error::PlacementError;
use super::repository::PlacementStores;

/// Optional narrowing for expected-visit listings; both filters combine with AND.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisitFilter {
    pub year: Option<i32>,
    pub status: Option<VisitStatus>,
}

/// Keeps the list of companies expected on campus, ahead of any announced drive.
pub struct ExpectedCompanyRegistry {
    stores: PlacementStores,
    clock: Arc<dyn Clock>,
}

impl ExpectedCompanyRegistry {
    pub fn new(stores: PlacementStores, clock: Arc<dyn Clock>) -> Self {
        Self { stores, clock }
    }

    pub fn create(&self, draft: ExpectedCompanyDraft) -> Result<ExpectedCompany, PlacementError> {
        draft.validate()?;

        let now = self.clock.now();
        let company = ExpectedCompany {
            id: self.stores.expected_companies.next_expected_id()?,
            company_name: draft.company_name.trim().to_string(),
            expected_year: draft.expected_year,
            status: draft.status,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        };

        let saved = self.stores.expected_companies.save_expected(company)?;
        info!(
            expected_company_id = %saved.id,
            company = %saved.company_name,
            year = saved.expected_year,
            status = %saved.status,
            "expected company recorded"
        );
        Ok(saved)
    }

    /// Replace name, year, status and notes; the creation time is kept.
    pub fn update(
        &self,
        id: ExpectedCompanyId,
        draft: ExpectedCompanyDraft,
    ) -> Result<ExpectedCompany, PlacementError> {
        draft.validate()?;

        let mut company = self.get(id)?;
        company.company_name = draft.company_name.trim().to_string();
        company.expected_year = draft.expected_year;
        company.status = draft.status;
        company.notes = draft.notes;
        company.updated_at = self.clock.now();

        let saved = self.stores.expected_companies.save_expected(company)?;
        info!(
            expected_company_id = %saved.id,
            status = %saved.status,
            "expected company updated"
        );
        Ok(saved)
    }

    pub fn get(&self, id: ExpectedCompanyId) -> Result<ExpectedCompany, PlacementError> {
        self.stores
            .expected_companies
            .find_expected(id)?
            .ok_or_else(|| PlacementError::expected_company_not_found(id))
    }

    /// Matching visits ordered by year, then company name.
    pub fn list(&self, filter: &VisitFilter) -> Result<Vec<ExpectedCompany>, PlacementError> {
        let store = &self.stores.expected_companies;
        let mut companies = match (filter.year, filter.status) {
            (Some(year), Some(status)) => store
                .list_expected_by_year(year)?
                .into_iter()
                .filter(|company| company.status == status)
                .collect(),
            (Some(year), None) => store.list_expected_by_year(year)?,
            (None, Some(status)) => store.list_expected_by_status(status)?,
            (None, None) => store.list_expected()?,
        };
        companies.sort_by(|a, b| {
            a.expected_year
                .cmp(&b.expected_year)
                .then_with(|| a.company_name.cmp(&b.company_name))
        });
        Ok(companies)
    }

    pub fn delete(&self, id: ExpectedCompanyId) -> Result<(), PlacementError> {
        if !self.stores.expected_companies.remove_expected(id)? {
            return Err(PlacementError::expected_company_not_found(id));
        }
        info!(expected_company_id = %id, "expected company removed");
        Ok(())
    }
}
