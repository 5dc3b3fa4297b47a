//! Exercise list controller
//!
//! Owns the normalized working set of one list session and exposes the
//! filtered, paginated view of it. The controller performs no I/O: the
//! shell starts a fetch with [`ExerciseListController::begin_fetch`],
//! runs it, and hands the outcome back with the ticket it was given.
//! Results carrying a stale ticket are discarded, so a fetch abandoned
//! through [`ExerciseListController::cancel_fetch`] can never update the
//! session afterwards.

use crate::catalog::{distinct_categories, ExerciseId, ExerciseRecord};
use crate::filter::FilterState;
use crate::pagination::{
    self, navigation_commands, page_info, paginate, NavigationCommands, PageInfo,
};
use serde::Serialize;
use std::num::NonZeroUsize;

/// Static message shown when the catalog cannot be loaded
pub const FETCH_FAILED_MESSAGE: &str = "Failed to load exercises.";

/// Lifecycle of the working set
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogState {
    Idle,
    Loading,
    Ready(Vec<ExerciseRecord>),
    Failed(String),
}

/// Identifies one fetch started by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

#[derive(Debug)]
struct InFlight {
    ticket: FetchTicket,
    previous: CatalogState,
}

/// Current page of the filtered working set
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<'a> {
    pub items: Vec<&'a ExerciseRecord>,
    pub info: PageInfo,
    pub total_records: usize,
}

#[derive(Debug)]
pub struct ExerciseListController {
    state: CatalogState,
    filter: FilterState,
    page_size: NonZeroUsize,
    in_flight: Option<InFlight>,
    next_ticket: u64,
}

impl ExerciseListController {
    pub fn new(page_size: NonZeroUsize) -> Self {
        Self {
            state: CatalogState::Idle,
            filter: FilterState::default(),
            page_size,
            in_flight: None,
            next_ticket: 0,
        }
    }

    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Enter `Loading` and hand out a ticket for the new fetch
    ///
    /// Returns `None` while another fetch is still in flight.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if self.in_flight.is_some() {
            return None;
        }

        let ticket = FetchTicket(self.next_ticket);
        self.next_ticket += 1;

        let previous = std::mem::replace(&mut self.state, CatalogState::Loading);
        self.in_flight = Some(InFlight { ticket, previous });

        Some(ticket)
    }

    /// Apply the outcome of the fetch identified by `ticket`
    ///
    /// Returns `false` and leaves the state untouched when the ticket does
    /// not belong to the fetch currently in flight.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<ExerciseRecord>, String>,
    ) -> bool {
        match &self.in_flight {
            Some(in_flight) if in_flight.ticket == ticket => {}
            _ => return false,
        }
        self.in_flight = None;

        self.state = match result {
            Ok(records) => {
                self.filter.current_page = 1;
                CatalogState::Ready(records)
            }
            Err(message) => CatalogState::Failed(message),
        };

        true
    }

    /// Abandon the fetch in flight and restore the state it replaced
    pub fn cancel_fetch(&mut self) -> bool {
        match self.in_flight.take() {
            Some(in_flight) => {
                self.state = in_flight.previous;
                true
            }
            None => false,
        }
    }

    /// Working set; empty unless `Ready`
    pub fn records(&self) -> &[ExerciseRecord] {
        match &self.state {
            CatalogState::Ready(records) => records,
            _ => &[],
        }
    }

    pub fn categories(&self) -> Vec<String> {
        distinct_categories(self.records())
    }

    pub fn set_category(&mut self, category: Option<&str>) {
        self.filter.select_category(category);
    }

    pub fn set_search(&mut self, query: &str) {
        self.filter.set_search(query);
    }

    pub fn clear_filters(&mut self) {
        self.filter.clear();
    }

    fn current_info(&self) -> Option<PageInfo> {
        match &self.state {
            CatalogState::Ready(records) => Some(page_info(
                self.filter.apply(records).len(),
                self.page_size,
                self.filter.current_page,
            )),
            _ => None,
        }
    }

    /// Advance one page; no-op on the last page
    pub fn next_page(&mut self) -> bool {
        let Some(info) = self.current_info() else {
            return false;
        };

        let page = pagination::next_page(&info);
        let moved = page != self.filter.current_page;
        self.filter.current_page = page;
        moved
    }

    /// Go back one page; no-op on the first page
    pub fn previous_page(&mut self) -> bool {
        let Some(info) = self.current_info() else {
            return false;
        };

        let page = pagination::previous_page(&info);
        let moved = page != self.filter.current_page;
        self.filter.current_page = page;
        moved
    }

    /// Flip the expanded flag of one record, returning its new value
    pub fn toggle_expanded(&mut self, id: &ExerciseId) -> Option<bool> {
        let CatalogState::Ready(records) = &mut self.state else {
            return None;
        };

        let record = records.iter_mut().find(|record| &record.id == id)?;
        record.expanded = !record.expanded;
        Some(record.expanded)
    }

    /// Current page of the filtered working set; `None` unless `Ready`
    pub fn view(&self) -> Option<ListView<'_>> {
        let CatalogState::Ready(records) = &self.state else {
            return None;
        };

        let filtered = self.filter.apply(records);
        let page = paginate(&filtered, self.page_size, self.filter.current_page);

        Some(ListView {
            items: page.items.to_vec(),
            info: page.info,
            total_records: records.len(),
        })
    }
}

/// Complete one-shot list output with records, pagination and navigation
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ExerciseListOutput {
    pub filter: FilterState,
    pub exercises: Vec<ExerciseRecord>,
    pub pagination: PageInfo,
    pub navigation: NavigationCommands,
    pub categories: Vec<String>,
}

/// Filter and paginate `records` into a serializable list output
///
/// Takes a freshly normalized working set and constructs:
/// - The records of the requested page, in catalog order
/// - Pagination metadata over the filtered collection
/// - Commands for the neighbouring pages
pub fn build_list_output(
    records: &[ExerciseRecord],
    filter: &FilterState,
    page_size: NonZeroUsize,
) -> ExerciseListOutput {
    let filtered = filter.apply(records);
    let page = paginate(&filtered, page_size, filter.current_page);

    ExerciseListOutput {
        filter: filter.clone(),
        exercises: page.items.iter().map(|record| (*record).clone()).collect(),
        pagination: page.info,
        navigation: navigation_commands(&page.info, filter),
        categories: distinct_categories(records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::DEFAULT_PAGE_SIZE;

    fn create_test_records(count: u64) -> Vec<ExerciseRecord> {
        (0..count)
            .map(|idx| ExerciseRecord {
                id: ExerciseId::Number(idx),
                name: format!("Exercise {idx}"),
                description: if idx % 2 == 0 {
                    "running drill".to_string()
                } else {
                    "static hold".to_string()
                },
                image_url: None,
                category: if idx % 3 == 0 { "Cardio" } else { "Strength" }.to_string(),
                expanded: false,
            })
            .collect()
    }

    fn create_ready_controller(count: u64) -> ExerciseListController {
        let mut controller = ExerciseListController::new(DEFAULT_PAGE_SIZE);
        let ticket = controller.begin_fetch().unwrap();
        assert!(controller.complete_fetch(ticket, Ok(create_test_records(count))));
        controller
    }

    #[test]
    fn test_new_controller_is_idle() {
        let controller = ExerciseListController::new(DEFAULT_PAGE_SIZE);

        assert_eq!(controller.state(), &CatalogState::Idle);
        assert!(controller.view().is_none());
        assert!(controller.records().is_empty());
    }

    #[test]
    fn test_begin_fetch_enters_loading() {
        let mut controller = ExerciseListController::new(DEFAULT_PAGE_SIZE);

        assert!(controller.begin_fetch().is_some());
        assert_eq!(controller.state(), &CatalogState::Loading);
        assert!(controller.is_loading());
    }

    #[test]
    fn test_begin_fetch_rejects_second_fetch_in_flight() {
        let mut controller = ExerciseListController::new(DEFAULT_PAGE_SIZE);

        assert!(controller.begin_fetch().is_some());
        assert!(controller.begin_fetch().is_none());
    }

    #[test]
    fn test_complete_fetch_success_resets_page() {
        let mut controller = create_ready_controller(25);
        controller.next_page();
        assert_eq!(controller.filter().current_page, 2);

        let ticket = controller.begin_fetch().unwrap();
        assert!(controller.complete_fetch(ticket, Ok(create_test_records(25))));

        assert_eq!(controller.filter().current_page, 1);
        assert_eq!(controller.records().len(), 25);
    }

    #[test]
    fn test_complete_fetch_failure() {
        let mut controller = ExerciseListController::new(DEFAULT_PAGE_SIZE);
        let ticket = controller.begin_fetch().unwrap();

        assert!(controller.complete_fetch(ticket, Err(FETCH_FAILED_MESSAGE.to_string())));
        assert_eq!(
            controller.state(),
            &CatalogState::Failed(FETCH_FAILED_MESSAGE.to_string())
        );
        assert!(!controller.is_loading());

        // A failed session may be retried manually
        assert!(controller.begin_fetch().is_some());
    }

    #[test]
    fn test_cancelled_fetch_result_is_discarded() {
        let mut controller = ExerciseListController::new(DEFAULT_PAGE_SIZE);
        let ticket = controller.begin_fetch().unwrap();

        assert!(controller.cancel_fetch());
        assert_eq!(controller.state(), &CatalogState::Idle);
        assert!(!controller.complete_fetch(ticket, Ok(create_test_records(3))));
        assert_eq!(controller.state(), &CatalogState::Idle);
    }

    #[test]
    fn test_cancel_refetch_restores_previous_data() {
        let mut controller = create_ready_controller(4);
        controller.begin_fetch().unwrap();

        assert!(controller.cancel_fetch());
        assert_eq!(controller.records().len(), 4);
        assert!(!controller.cancel_fetch());
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut controller = ExerciseListController::new(DEFAULT_PAGE_SIZE);
        let stale = controller.begin_fetch().unwrap();
        controller.cancel_fetch();
        let current = controller.begin_fetch().unwrap();

        assert!(!controller.complete_fetch(stale, Ok(create_test_records(1))));
        assert!(controller.complete_fetch(current, Ok(create_test_records(2))));
        assert_eq!(controller.records().len(), 2);
    }

    #[test]
    fn test_empty_catalog_is_ready_with_disabled_navigation() {
        let mut controller = create_ready_controller(0);

        assert_eq!(controller.state(), &CatalogState::Ready(vec![]));
        let view = controller.view().unwrap();
        assert!(view.items.is_empty());
        assert!(!view.info.has_next_page);
        assert!(!view.info.has_previous_page);

        assert!(!controller.next_page());
        assert!(!controller.previous_page());
    }

    #[test]
    fn test_navigation_is_bounded() {
        let mut controller = create_ready_controller(25);

        assert!(!controller.previous_page());
        assert!(controller.next_page());
        assert!(controller.next_page());
        assert!(!controller.next_page());
        assert_eq!(controller.filter().current_page, 3);

        let view = controller.view().unwrap();
        assert_eq!(view.items.len(), 5);
        assert_eq!(view.items[0].id, ExerciseId::Number(20));
        assert!(!view.info.has_next_page);
        assert!(view.info.has_previous_page);
    }

    #[test]
    fn test_filter_changes_reset_page() {
        let mut controller = create_ready_controller(25);
        controller.next_page();

        controller.set_search("RUNNING");
        assert_eq!(controller.filter().current_page, 1);

        let view = controller.view().unwrap();
        assert_eq!(view.info.total_items, 13);
        assert_eq!(view.total_records, 25);

        controller.next_page();
        controller.set_category(Some("Cardio"));
        assert_eq!(controller.filter().current_page, 1);

        // Cardio AND "running": ids divisible by 6 in 0..25
        assert_eq!(controller.view().unwrap().info.total_items, 5);
    }

    #[test]
    fn test_navigation_without_data_is_noop() {
        let mut controller = ExerciseListController::new(DEFAULT_PAGE_SIZE);

        assert!(!controller.next_page());
        assert!(!controller.previous_page());
        assert_eq!(controller.filter().current_page, 1);
    }

    #[test]
    fn test_toggle_expanded() {
        let mut controller = create_ready_controller(3);
        let id = ExerciseId::Number(1);

        assert_eq!(controller.toggle_expanded(&id), Some(true));
        assert!(controller.records()[1].expanded);
        assert_eq!(controller.toggle_expanded(&id), Some(false));
        assert_eq!(controller.toggle_expanded(&ExerciseId::Number(99)), None);
    }

    #[test]
    fn test_toggle_expanded_not_ready() {
        let mut controller = ExerciseListController::new(DEFAULT_PAGE_SIZE);
        assert_eq!(controller.toggle_expanded(&ExerciseId::Number(0)), None);
    }

    #[test]
    fn test_categories_follow_working_set() {
        let controller = create_ready_controller(4);
        assert_eq!(controller.categories(), vec!["Cardio", "Strength"]);
    }

    #[test]
    fn test_build_list_output_third_page() {
        let records = create_test_records(25);
        let filter = FilterState {
            current_page: 3,
            ..FilterState::default()
        };

        let output = build_list_output(&records, &filter, DEFAULT_PAGE_SIZE);

        assert_eq!(output.exercises.len(), 5);
        assert_eq!(output.exercises[0].id, ExerciseId::Number(20));
        assert_eq!(output.pagination.total_pages, 3);
        assert!(output.navigation.next_page_command.is_none());
        assert_eq!(
            output.navigation.prev_page_command,
            Some("unifit exercises list --page 2".to_string())
        );
        assert_eq!(output.categories, vec!["Cardio", "Strength"]);
    }

    #[test]
    fn test_build_list_output_filtered() {
        let records = create_test_records(25);
        let mut filter = FilterState::default();
        filter.select_category(Some("Strength"));
        filter.set_search("hold");

        let output = build_list_output(&records, &filter, DEFAULT_PAGE_SIZE);

        assert!(output
            .exercises
            .iter()
            .all(|r| r.category == "Strength" && r.description == "static hold"));
        assert_eq!(output.filter.selected_category, Some("Strength".to_string()));
    }

    #[test]
    fn test_build_list_output_empty_catalog() {
        let output = build_list_output(&[], &FilterState::default(), DEFAULT_PAGE_SIZE);

        assert!(output.exercises.is_empty());
        assert_eq!(output.pagination.total_items, 0);
        assert!(!output.pagination.has_next_page);
        assert!(!output.pagination.has_previous_page);
    }

    #[test]
    fn test_clear_filters() {
        let mut controller = create_ready_controller(25);
        controller.set_category(Some("Cardio"));
        controller.set_search("hold");

        controller.clear_filters();

        assert_eq!(controller.filter(), &FilterState::default());
        assert_eq!(controller.view().unwrap().info.total_items, 25);
    }
}
