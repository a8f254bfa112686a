use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::BoardError;
use crate::filter::{match_postings, CategoryChoice, CategorySelection, Choice, FilterState, SearchField};
use crate::models::{JobId, JobPosting, Level, PostingDraft};
use crate::notice::{Notice, NoticeBoard, NoticeKind, DEFAULT_DURATION};
use crate::pagination::Pagination;
use crate::store::JobStore;
use crate::suggest::{suggest_category, NO_SUGGESTION};

pub const EMPTY_RESULTS: &str = "No jobs found - try different filters.";

/// Inbound UI events.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    CategorySelected(CategoryChoice),
    KeywordChanged(String),
    LevelChanged(Choice<Level>),
    LocationChanged(Choice<String>),
    LoadMore,
    EmployerSubmit(PostingDraft),
    Apply(JobId),
    Save(JobId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCard {
    pub posting: JobPosting,
    pub applied: bool,
    pub saved: bool,
}

/// Filtered, paginated data handed to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardView {
    pub cards: Vec<JobCard>,
    pub total: usize,
    pub has_more: bool,
    pub results_line: String,
    pub filter_summary: String,
}

impl BoardView {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

pub trait Renderer {
    fn render(&mut self, view: &BoardView) -> Result<()>;
}

/// Last-write-wins delay for keyword recomputation.
#[derive(Debug, Clone)]
pub struct Debouncer {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once per scheduled deadline, when it has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(at) if at <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

pub struct ViewController<R: Renderer> {
    store: JobStore,
    renderer: R,
    filter: FilterState,
    pending_keyword: Option<String>,
    pagination: Pagination,
    notices: NoticeBoard,
    debouncer: Debouncer,
    search_fields: Vec<SearchField>,
    fallback_location: String,
    suggestion: String,
}

impl<R: Renderer> ViewController<R> {
    pub fn new(store: JobStore, renderer: R, config: &Config) -> Self {
        Self {
            store,
            renderer,
            filter: FilterState::default(),
            pending_keyword: None,
            pagination: Pagination::default(),
            notices: NoticeBoard::default(),
            debouncer: Debouncer::new(config.debounce()),
            search_fields: config.search_fields.clone(),
            fallback_location: config.fallback_location.clone(),
            suggestion: NO_SUGGESTION.to_string(),
        }
    }

    /// Runs the course-based suggestion and draws the first page.
    pub fn init(&mut self, config: &Config, now: Instant) -> Result<()> {
        if let Some(category) = suggest_category(&config.profile, &config.course_catalog) {
            info!(category, "suggested category from completed courses");
            self.filter.categories = CategorySelection::only(category);
            self.suggestion = category.to_string();
        }
        self.recompute(now)?;
        self.notify(NoticeKind::Info, "Job Board loaded", Duration::from_millis(1000), now);
        Ok(())
    }

    pub fn handle(&mut self, event: BoardEvent, now: Instant) -> Result<()> {
        debug!(?event, "board event");
        match event {
            BoardEvent::CategorySelected(choice) => {
                self.filter.categories.toggle(&choice);
                self.recompute(now)
            }
            BoardEvent::KeywordChanged(text) => {
                self.pending_keyword = Some(text);
                self.debouncer.schedule(now);
                Ok(())
            }
            BoardEvent::LevelChanged(level) => {
                self.filter.level = level;
                self.recompute(now)
            }
            BoardEvent::LocationChanged(location) => {
                self.filter.location = location;
                self.recompute(now)
            }
            BoardEvent::LoadMore => self.load_more(now),
            BoardEvent::EmployerSubmit(draft) => self.submit(draft, now),
            BoardEvent::Apply(id) => self.apply(id, now),
            BoardEvent::Save(id) => self.save(id, now),
        }
    }

    /// Fires a due keyword recompute and drops expired notices.
    pub fn tick(&mut self, now: Instant) -> Result<()> {
        if self.debouncer.fire(now) {
            self.recompute(now)?;
        }
        self.notices.prune(now);
        Ok(())
    }

    fn matches(&self) -> Vec<&JobPosting> {
        match_postings(self.store.postings(), &self.filter, &self.search_fields)
    }

    /// Applies typed-but-debounced keyword text. True if there was any.
    fn flush_keyword(&mut self) -> bool {
        self.debouncer.cancel();
        match self.pending_keyword.take() {
            Some(keyword) => {
                self.filter.keyword = keyword;
                true
            }
            None => false,
        }
    }

    fn recompute(&mut self, now: Instant) -> Result<()> {
        self.flush_keyword();

        let count = self.matches().len();
        self.pagination.reset(count);
        self.redraw()?;
        self.notify(NoticeKind::Info, format!("{} match(es)", count), Duration::from_millis(1000), now);
        Ok(())
    }

    fn load_more(&mut self, now: Instant) -> Result<()> {
        let flushed = self.flush_keyword();
        let count = self.matches().len();
        if flushed {
            self.pagination.reset(count);
        }
        self.pagination.load_more(count);
        self.redraw()?;
        let shown = self.pagination.shown(count);
        self.notify(
            NoticeKind::Info,
            format!("Showing {} of {}", shown, count),
            Duration::from_millis(1000),
            now,
        );
        Ok(())
    }

    fn submit(&mut self, draft: PostingDraft, now: Instant) -> Result<()> {
        let missing = draft.missing_fields();
        if !missing.is_empty() {
            self.notify(
                NoticeKind::Error,
                format!("Please fill in: {}", missing.join(", ")),
                DEFAULT_DURATION,
                now,
            );
            return Ok(());
        }
        let posting = self.store.add_posting(draft, &self.fallback_location)?;
        info!(id = posting.id, title = %posting.title, "employer posting added");
        self.recompute(now)?;
        self.notify(NoticeKind::Success, "Job added", Duration::from_millis(1600), now);
        Ok(())
    }

    fn apply(&mut self, id: JobId, now: Instant) -> Result<()> {
        let Some(job) = self.store.find(id) else {
            return self.not_found(id, now);
        };
        let message = format!("Applied for \"{}\" at {}", job.title, job.company);
        if self.store.record_applied(id)? {
            self.redraw()?;
            self.notify(NoticeKind::Success, message, Duration::from_millis(2500), now);
        } else {
            self.notify(
                NoticeKind::Info,
                "You already applied for this job",
                Duration::from_millis(1200),
                now,
            );
        }
        Ok(())
    }

    fn save(&mut self, id: JobId, now: Instant) -> Result<()> {
        if self.store.find(id).is_none() {
            return self.not_found(id, now);
        }
        if self.store.record_saved(id)? {
            self.redraw()?;
            self.notify(NoticeKind::Success, "Saved job to your profile", Duration::from_millis(2000), now);
        } else {
            self.notify(NoticeKind::Info, "You already saved this job", Duration::from_millis(1200), now);
        }
        Ok(())
    }

    fn not_found(&mut self, id: JobId, now: Instant) -> Result<()> {
        warn!(error = %BoardError::JobNotFound(id), "stale job reference");
        self.notify(NoticeKind::Error, "Job not found", DEFAULT_DURATION, now);
        Ok(())
    }

    fn notify(&mut self, kind: NoticeKind, message: impl Into<String>, duration: Duration, now: Instant) {
        self.notices.push(kind, message, duration, now);
    }

    pub fn view(&self) -> Result<BoardView> {
        let applied = self.store.applied_set()?;
        let saved = self.store.saved_set()?;
        let matches = self.matches();
        let total = matches.len();
        let cards = matches
            .into_iter()
            .take(self.pagination.visible())
            .map(|job| JobCard {
                posting: job.clone(),
                applied: applied.contains(&job.id),
                saved: saved.contains(&job.id),
            })
            .collect();
        let results_line = if total == 0 {
            EMPTY_RESULTS.to_string()
        } else {
            format!("{} job(s) found", total)
        };
        Ok(BoardView {
            cards,
            total,
            has_more: self.pagination.has_more(total),
            results_line,
            filter_summary: self.filter.summary(),
        })
    }

    fn redraw(&mut self) -> Result<()> {
        let view = self.view()?;
        self.renderer.render(&view)
    }

    // --- Accessors for the UI adapter ---

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Keyword as typed, including text still waiting on the debounce.
    pub fn keyword_input(&self) -> &str {
        self.pending_keyword.as_deref().unwrap_or(&self.filter.keyword)
    }

    pub fn suggestion(&self) -> &str {
        &self.suggestion
    }

    pub fn notices(&self) -> &[Notice] {
        self.notices.live()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn visible(&self) -> usize {
        self.pagination.visible()
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, StorageScope};
    use crate::models::seed_postings;
    use crate::suggest::UserProfile;

    #[derive(Default)]
    struct Recorder {
        views: Vec<BoardView>,
    }

    impl Renderer for Recorder {
        fn render(&mut self, view: &BoardView) -> Result<()> {
            self.views.push(view.clone());
            Ok(())
        }
    }

    fn no_suggestion_config() -> Config {
        Config {
            profile: UserProfile {
                name: "Test".into(),
                completed_courses: Vec::new(),
            },
            ..Config::default()
        }
    }

    fn controller_with(config: &Config, postings: Vec<JobPosting>) -> ViewController<Recorder> {
        let mut store = JobStore::open(Database::open_in_memory().unwrap(), config.applied_scope).unwrap();
        store.save(&postings).unwrap();
        store.reload().unwrap();
        let mut ctl = ViewController::new(store, Recorder::default(), config);
        ctl.init(config, Instant::now()).unwrap();
        ctl
    }

    fn controller() -> ViewController<Recorder> {
        controller_with(&no_suggestion_config(), seed_postings())
    }

    fn many_postings(n: i64) -> Vec<JobPosting> {
        let template = seed_postings().remove(0);
        (1..=n)
            .map(|id| JobPosting {
                id,
                ..template.clone()
            })
            .collect()
    }

    fn last_view(ctl: &ViewController<Recorder>) -> &BoardView {
        ctl.renderer().views.last().unwrap()
    }

    fn last_message(ctl: &ViewController<Recorder>) -> &str {
        &ctl.notices().last().unwrap().message
    }

    #[test]
    fn init_without_suggestion_shows_everything() {
        let ctl = controller();
        assert_eq!(ctl.suggestion(), NO_SUGGESTION);
        assert_eq!(ctl.filter().categories, CategorySelection::All);
        let view = last_view(&ctl);
        assert_eq!(view.total, 10);
        assert_eq!(view.cards.len(), 10);
        assert_eq!(view.results_line, "10 job(s) found");
        assert_eq!(last_message(&ctl), "Job Board loaded");
    }

    #[test]
    fn init_preselects_suggested_category() {
        let config = Config::default();
        let ctl = controller_with(&config, seed_postings());
        assert_eq!(ctl.suggestion(), "IT");
        assert_eq!(ctl.filter().categories, CategorySelection::only("IT"));
        assert!(last_view(&ctl).cards.iter().all(|c| c.posting.category == "IT"));
    }

    #[test]
    fn category_then_keyword_after_debounce() {
        let mut ctl = controller();
        let start = Instant::now();
        ctl.handle(BoardEvent::CategorySelected(CategoryChoice::Category("IT".into())), start)
            .unwrap();
        ctl.handle(BoardEvent::KeywordChanged("we".into()), start).unwrap();
        ctl.handle(BoardEvent::KeywordChanged("web".into()), start + Duration::from_millis(100))
            .unwrap();
        assert_eq!(ctl.keyword_input(), "web");
        assert_eq!(ctl.filter().keyword, "");

        // restarted timer has not elapsed yet
        ctl.tick(start + Duration::from_millis(250)).unwrap();
        assert_eq!(ctl.filter().keyword, "");

        ctl.tick(start + Duration::from_millis(400)).unwrap();
        assert_eq!(ctl.filter().keyword, "web");
        let titles: Vec<&str> = last_view(&ctl).cards.iter().map(|c| c.posting.title.as_str()).collect();
        assert_eq!(titles, vec!["Junior Web Developer", "Frontend Engineer (React)"]);
    }

    #[test]
    fn dropdown_change_flushes_pending_keyword() {
        let mut ctl = controller();
        let now = Instant::now();
        ctl.handle(BoardEvent::KeywordChanged("python".into()), now).unwrap();
        ctl.handle(BoardEvent::LevelChanged(Choice::Exact(Level::Junior)), now).unwrap();
        assert_eq!(ctl.filter().keyword, "python");
        assert_eq!(ctl.next_deadline(), None);
        assert_eq!(last_view(&ctl).total, 1);
    }

    #[test]
    fn mid_level_yields_single_civil_engineering_posting() {
        let postings: Vec<JobPosting> = seed_postings().into_iter().filter(|j| j.id != 7).collect();
        let mut ctl = controller_with(&no_suggestion_config(), postings);
        ctl.handle(BoardEvent::LevelChanged(Choice::Exact(Level::Mid)), Instant::now())
            .unwrap();
        let view = last_view(&ctl);
        assert_eq!(view.total, 1);
        assert_eq!(view.cards[0].posting.title, "Civil Engineering Assistant");
        assert_eq!(last_message(&ctl), "1 match(es)");
    }

    #[test]
    fn empty_result_uses_empty_state_message() {
        let mut ctl = controller();
        ctl.handle(BoardEvent::LocationChanged(Choice::Exact("Oshakati".into())), Instant::now())
            .unwrap();
        let view = last_view(&ctl);
        assert!(view.is_empty());
        assert_eq!(view.results_line, EMPTY_RESULTS);
        assert!(!view.has_more);
    }

    #[test]
    fn pagination_resets_and_loads_more() {
        let mut ctl = controller_with(&no_suggestion_config(), many_postings(20));
        let now = Instant::now();
        assert_eq!(ctl.visible(), 12);
        assert_eq!(last_view(&ctl).cards.len(), 12);
        assert!(last_view(&ctl).has_more);

        ctl.handle(BoardEvent::LoadMore, now).unwrap();
        assert_eq!(last_view(&ctl).cards.len(), 18);
        ctl.handle(BoardEvent::LoadMore, now).unwrap();
        assert_eq!(last_view(&ctl).cards.len(), 20);
        assert!(!last_view(&ctl).has_more);

        ctl.handle(BoardEvent::LevelChanged(Choice::Exact(Level::Junior)), now).unwrap();
        assert_eq!(ctl.visible(), 12);
    }

    #[test]
    fn load_more_applies_pending_keyword_first() {
        let mut ctl = controller_with(&no_suggestion_config(), many_postings(30));
        let start = Instant::now();
        ctl.handle(BoardEvent::KeywordChanged("web".into()), start).unwrap();
        ctl.handle(BoardEvent::LoadMore, start + Duration::from_millis(50)).unwrap();
        assert_eq!(ctl.filter().keyword, "web");
        assert_eq!(ctl.next_deadline(), None);
        assert_eq!(ctl.visible(), 18);
        assert_eq!(last_message(&ctl), "Showing 18 of 30");

        // nothing left to fire, so the extra page survives
        ctl.tick(start + Duration::from_millis(300)).unwrap();
        assert_eq!(ctl.visible(), 18);
        assert_eq!(last_view(&ctl).cards.len(), 18);
    }

    #[test]
    fn load_more_with_narrowing_keyword_resets_first() {
        let mut postings = many_postings(30);
        for job in postings.iter_mut().skip(8) {
            job.title = "Cashier".into();
            job.description = "Till work".into();
            job.company = "Shop".into();
        }
        let mut ctl = controller_with(&no_suggestion_config(), postings);
        let now = Instant::now();
        ctl.handle(BoardEvent::LoadMore, now).unwrap();
        assert_eq!(ctl.visible(), 18);
        ctl.handle(BoardEvent::KeywordChanged("web".into()), now).unwrap();
        ctl.handle(BoardEvent::LoadMore, now).unwrap();
        assert_eq!(last_view(&ctl).total, 8);
        assert_eq!(last_view(&ctl).cards.len(), 8);
        assert_eq!(ctl.visible(), 8);
    }

    #[test]
    fn repeated_apply_records_once_with_distinct_notice() {
        let mut ctl = controller();
        let now = Instant::now();
        ctl.handle(BoardEvent::Apply(1), now).unwrap();
        let first = last_message(&ctl).to_string();
        ctl.handle(BoardEvent::Apply(1), now).unwrap();
        let second = last_message(&ctl).to_string();

        assert_eq!(first, "Applied for \"Junior Web Developer\" at Tech Solutions Namibia");
        assert_eq!(second, "You already applied for this job");
        assert_eq!(ctl.store().applied_ids().unwrap(), vec![1]);
        assert!(last_view(&ctl).cards.iter().find(|c| c.posting.id == 1).unwrap().applied);
    }

    #[test]
    fn repeated_save_is_informational() {
        let mut ctl = controller();
        let now = Instant::now();
        ctl.handle(BoardEvent::Save(4), now).unwrap();
        assert_eq!(ctl.notices().last().unwrap().kind, NoticeKind::Success);
        ctl.handle(BoardEvent::Save(4), now).unwrap();
        assert_eq!(ctl.notices().last().unwrap().kind, NoticeKind::Info);
        assert_eq!(ctl.store().saved_ids().unwrap(), vec![4]);
    }

    #[test]
    fn unknown_id_is_an_error_notice_without_mutation() {
        let mut ctl = controller();
        let renders = ctl.renderer().views.len();
        ctl.handle(BoardEvent::Apply(999), Instant::now()).unwrap();
        ctl.handle(BoardEvent::Save(999), Instant::now()).unwrap();
        let notice = ctl.notices().last().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.message, "Job not found");
        assert!(ctl.store().applied_ids().unwrap().is_empty());
        assert!(ctl.store().saved_ids().unwrap().is_empty());
        assert_eq!(ctl.renderer().views.len(), renders);
    }

    #[test]
    fn employer_submit_prepends_with_fallback_town() {
        let mut ctl = controller();
        let draft = PostingDraft {
            title: "QA Tester".into(),
            company: "Acme".into(),
            category: "IT".into(),
            location: "  ".into(),
            level: Some(Level::Junior),
            description: "test".into(),
        };
        ctl.handle(BoardEvent::EmployerSubmit(draft), Instant::now()).unwrap();

        let first = &ctl.store().postings()[0];
        assert_eq!(first.title, "QA Tester");
        assert_eq!(first.location, "Windhoek");
        assert_eq!(last_view(&ctl).cards[0].posting.title, "QA Tester");
        let notice = ctl.notices().last().unwrap();
        assert_eq!((notice.kind, notice.message.as_str()), (NoticeKind::Success, "Job added"));
    }

    #[test]
    fn incomplete_employer_submit_is_rejected() {
        let mut ctl = controller();
        ctl.handle(BoardEvent::EmployerSubmit(PostingDraft::default()), Instant::now())
            .unwrap();
        assert_eq!(ctl.store().postings().len(), 10);
        assert_eq!(
            last_message(&ctl),
            "Please fill in: title, company, category, level, description"
        );
    }

    #[test]
    fn session_scope_flag_is_respected() {
        let config = Config {
            applied_scope: StorageScope::Session,
            ..no_suggestion_config()
        };
        let mut ctl = controller_with(&config, seed_postings());
        ctl.handle(BoardEvent::Apply(2), Instant::now()).unwrap();
        assert_eq!(ctl.store().applied_ids().unwrap(), vec![2]);
    }

    #[test]
    fn notices_expire_on_tick() {
        let mut ctl = controller();
        let later = Instant::now() + Duration::from_secs(5);
        ctl.tick(later).unwrap();
        assert!(ctl.notices().is_empty());
    }
}
