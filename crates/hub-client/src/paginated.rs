use hub_common::{Entity, HubConfig, HubError, HubResult, PageResult};
use serde_json::Value;

use crate::api::{response_data, ApiClient};

#[derive(Debug, Clone, PartialEq)]
pub struct ListOptions {
    pub page_size: u32,
    /// `Some(true)` lists public records instead of the caller's own.
    pub public: Option<bool>,
    /// Server-side filter, sent JSON-encoded as the `query` parameter.
    pub query: Option<Value>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page_size: 10,
            public: None,
            query: None,
        }
    }
}

impl ListOptions {
    pub fn page_size(page_size: u32) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }
}

/// Page-at-a-time view over a cursor-paginated list endpoint.
///
/// The server only hands out forward cursors (`lastRecordId`), so every
/// visited cursor is kept in `pages`: `pages[i]` fetches page `i`, and
/// `pages[0]` is always `None`. The vector only ever grows or shrinks at
/// `current_page + 1`.
#[derive(Debug)]
pub struct PaginatedList {
    api: ApiClient,
    name: &'static str,
    options: ListOptions,
    pages: Vec<Option<String>>,
    current_page: usize,
    total_pages: usize,
    results: Vec<Entity>,
}

impl PaginatedList {
    /// Builds the cursor and fetches the first page. A failed first fetch
    /// is logged and leaves `results` empty; only a zero page size is an error.
    pub async fn new(
        api: &ApiClient,
        config: &HubConfig,
        resource: &str,
        name: &'static str,
        options: ListOptions,
    ) -> HubResult<Self> {
        if options.page_size == 0 {
            return Err(HubError::InvalidPageSize);
        }

        let mut list = Self {
            api: api.rebase(config.v1_url(&format!("/{resource}"))),
            name,
            options,
            pages: vec![None],
            current_page: 0,
            total_pages: 1,
            results: Vec::new(),
        };
        list.goto(0, "first").await;
        Ok(list)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn results(&self) -> &[Entity] {
        &self.results
    }

    pub fn into_results(self) -> Vec<Entity> {
        self.results
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn page_size(&self) -> u32 {
        self.options.page_size
    }

    pub fn cursors(&self) -> &[Option<String>] {
        &self.pages
    }

    /// True when `next()` would fetch: the page count allows it and a cursor
    /// for the following page is known.
    pub fn has_next(&self) -> bool {
        self.current_page + 1 < self.total_pages
            && matches!(self.pages.get(self.current_page + 1), Some(Some(_)))
    }

    /// Advances one page. Returns false (without a request) at the last page,
    /// and false (position unchanged, results cleared) if the fetch fails.
    pub async fn next(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.goto(self.current_page + 1, "next").await
    }

    /// Steps back one page using the stored cursor. No-op on page 0.
    pub async fn previous(&mut self) -> bool {
        if self.current_page == 0 {
            return false;
        }
        self.goto(self.current_page - 1, "previous").await
    }

    /// Refetches the current page.
    pub async fn reload(&mut self) -> bool {
        self.goto(self.current_page, "current").await
    }

    /// One raw list request. Errors are logged and returned; `Ok(None)` means
    /// the failure was suppressed by the client's error policy.
    pub async fn list(
        &self,
        page_size: u32,
        last_record: Option<&str>,
        query: Option<&Value>,
    ) -> HubResult<Option<PageResult>> {
        let mut params = vec![("perPage", page_size.to_string())];
        if let Some(last) = last_record {
            params.push(("lastRecordId", last.to_string()));
        }
        if let Some(query) = query {
            params.push(("query", query.to_string()));
        }
        if let Some(public) = self.options.public {
            params.push(("public", public.to_string()));
        }

        let result = match self.api.get("", &params).await {
            Ok(Some(resp)) => response_data::<PageResult>(&resp).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            tracing::error!(error=%e, "failed to list {}", self.name);
        }
        result
    }

    async fn goto(&mut self, target: usize, which: &str) -> bool {
        match self.load(target).await {
            Ok(true) => true,
            Ok(false) => {
                self.results.clear();
                tracing::error!(list = self.name, "failed to get {which} page: no response");
                false
            }
            Err(e) => {
                self.results.clear();
                tracing::error!(list = self.name, error=%e, "failed to get {which} page");
                false
            }
        }
    }

    async fn load(&mut self, target: usize) -> HubResult<bool> {
        let cursor = self.pages.get(target).cloned().flatten();
        let query = self.options.query.clone();
        let page = self
            .list(self.options.page_size, cursor.as_deref(), query.as_ref())
            .await?;

        match page {
            Some(page) => {
                self.current_page = target;
                self.update(page)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn update(&mut self, page: PageResult) -> HubResult<()> {
        let page_size = u64::from(self.options.page_size);
        // Floor division: a trailing partial page is not counted.
        let total = page
            .total_count
            .checked_div(page_size)
            .ok_or(HubError::InvalidPageSize)?;
        self.total_pages = usize::try_from(total).unwrap_or(usize::MAX).max(1);
        self.results = page.results;

        let frontier = self.current_page + 1;
        match page.last_record_id {
            Some(cursor) if self.pages.len() <= frontier => self.pages.push(Some(cursor)),
            Some(cursor) => self.pages[frontier] = Some(cursor),
            None => self.pages.truncate(frontier),
        }
        Ok(())
    }
}
