//! Recipe accessor
//!
//! Fronts the content repository with the recipe cache store. Reads go
//! through `get_or_load` (deduplicated, tag-indexed) with per-file
//! conditional fetches underneath; on upstream failure the stale cached
//! list is served instead. There is no substitute tier for recipes:
//! with nothing cached, the failure propagates with a clear message.
//!
//! Admin mutations commit markdown files through the repository and then
//! invalidate the `recipes` tag so the next read refetches.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{
    CacheOptions, CacheStore, ConditionalCache, ConditionalResponse, Fetched, LoadError, Refreshed,
};
use crate::clock::Clock;
use crate::error::AppError;
use crate::fallback::{self, Provenance, Resolved};
use crate::recipes::{markdown, Recipe};
use crate::upstream::{CommitInfo, FileFetch, RecipeRepository, RepoFile, UpstreamError};

use super::to_load_error;

/// Cache key for the full recipe list
pub const RECIPE_CACHE_KEY: &str = "recipes:all";
/// Invalidation tag covering every recipe entry
pub const RECIPES_TAG: &str = "recipes";

/// Cache-fronted access to the recipe catalog
pub struct RecipeService {
    repository: Arc<dyn RecipeRepository>,
    store: Arc<CacheStore<Vec<Recipe>>>,
    file_cache: ConditionalCache<String>,
    recipes_dir: String,
    ttl: Duration,
}

impl RecipeService {
    pub fn new(
        repository: Arc<dyn RecipeRepository>,
        store: Arc<CacheStore<Vec<Recipe>>>,
        recipes_dir: impl Into<String>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            store,
            file_cache: ConditionalCache::new(clock),
            recipes_dir: recipes_dir.into(),
            ttl,
        }
    }

    /// The backing store, for the admin stats/clear surface
    pub fn store(&self) -> &Arc<CacheStore<Vec<Recipe>>> {
        &self.store
    }

    /// Get the recipe list: live cache, else a deduplicated refetch,
    /// else the stale cached copy
    pub async fn get_all(&self) -> Result<Resolved<Vec<Recipe>>, AppError> {
        let options = CacheOptions {
            ttl: Some(self.ttl),
            tags: vec![RECIPES_TAG.to_string()],
        };

        let fetched = self
            .store
            .get_or_load(RECIPE_CACHE_KEY, options, || self.load_all())
            .await;

        match fetched {
            Ok(Fetched::Hit(recipes)) => Ok(Resolved {
                value: recipes,
                source: Provenance::Cache,
            }),
            Ok(Fetched::Loaded(recipes)) => Ok(Resolved {
                value: recipes,
                source: Provenance::Fresh,
            }),
            Err(err) => {
                let message = err.to_string();
                let stale = self.store.get_stale(RECIPE_CACHE_KEY);
                fallback::resolve(err.into(), stale, None)
                    .ok_or(AppError::Upstream(message))
            }
        }
    }

    /// Full refetch: list the directory, fetch each file (conditionally,
    /// concurrently), parse what parses
    async fn load_all(&self) -> Result<Vec<Recipe>, LoadError> {
        let files = self
            .repository
            .list_recipe_files()
            .await
            .map_err(to_load_error)?;

        let fetches = files.iter().map(|file| self.load_file(file));
        let results = futures::future::join_all(fetches).await;

        let mut recipes = Vec::with_capacity(results.len());
        for (file, result) in files.iter().zip(results) {
            match result {
                Ok(Some(recipe)) => recipes.push(recipe),
                // Unparseable files are skipped, not fatal
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(file = %file.name, error = %err, "failed to fetch recipe file");
                }
            }
        }

        tracing::info!(count = recipes.len(), "loaded recipe catalog");
        Ok(recipes)
    }

    async fn load_file(&self, file: &RepoFile) -> Result<Option<Recipe>, UpstreamError> {
        let refreshed = self
            .file_cache
            .refresh(&file.path, |validator| async move {
                match self
                    .repository
                    .fetch_file(&file.path, validator.as_deref())
                    .await?
                {
                    FileFetch::NotModified => Ok(ConditionalResponse::NotModified),
                    FileFetch::Fetched {
                        content, validator, ..
                    } => Ok(ConditionalResponse::Fresh {
                        payload: content,
                        validator,
                    }),
                }
            })
            .await?;

        let content = match refreshed {
            Refreshed::Fresh { payload } => payload,
            Refreshed::NotModified { payload: Some(payload) } => payload,
            Refreshed::NotModified { payload: None } => {
                // A validator with no retained payload; refetch plainly
                match self.repository.fetch_file(&file.path, None).await? {
                    FileFetch::Fetched { content, .. } => content,
                    FileFetch::NotModified => return Ok(None),
                }
            }
        };

        let slug = file.name.trim_end_matches(".md");
        let recipe = markdown::parse_recipe(slug, &content);
        if recipe.is_none() {
            tracing::warn!(file = %file.name, "skipping unparseable recipe file");
        }
        Ok(recipe)
    }

    /// Commit a new recipe file, then invalidate the recipe cache
    pub async fn create(&self, recipe: &Recipe) -> Result<CommitInfo, UpstreamError> {
        let path = recipe.repo_path(&self.recipes_dir);
        let content = markdown::format_recipe(recipe);
        let message = format!("Add recipe: {}", recipe.name);

        let commit = self
            .repository
            .put_file(&path, &content, &message, None)
            .await?;
        self.invalidate();
        Ok(commit)
    }

    /// Commit an update to an existing recipe file at its current sha,
    /// then invalidate the recipe cache
    pub async fn update(&self, recipe: &Recipe) -> Result<CommitInfo, UpstreamError> {
        let path = recipe.repo_path(&self.recipes_dir);
        let sha = self.current_sha(&path).await?;
        let content = markdown::format_recipe(recipe);
        let message = format!("Update recipe: {}", recipe.name);

        let commit = self
            .repository
            .put_file(&path, &content, &message, Some(&sha))
            .await?;
        self.file_cache.forget(&path);
        self.invalidate();
        Ok(commit)
    }

    /// Delete a recipe file, then invalidate the recipe cache
    pub async fn delete(&self, slug: &str) -> Result<CommitInfo, UpstreamError> {
        let path = format!("{}/{}.md", self.recipes_dir.trim_end_matches('/'), slug);
        let sha = self.current_sha(&path).await?;
        let message = format!("Delete recipe: {}", slug);

        let commit = self.repository.delete_file(&path, &message, &sha).await?;
        self.file_cache.forget(&path);
        self.invalidate();
        Ok(commit)
    }

    async fn current_sha(&self, path: &str) -> Result<String, UpstreamError> {
        match self.repository.fetch_file(path, None).await? {
            FileFetch::Fetched { sha, .. } => Ok(sha),
            FileFetch::NotModified => Err(UpstreamError::Malformed(
                "unconditional fetch answered not-modified".to_string(),
            )),
        }
    }

    /// Drop every cached recipe entry (version bump + tag clear)
    pub fn invalidate(&self) {
        self.store.invalidate(Some(RECIPES_TAG));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::upstream::RepoFile;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PAD_THAI_MD: &str =
        "---\ntitle: Pad Thai\ndescription: Noodles\nservings: 2\n---\n\nbody";
    const OMELETTE_MD: &str =
        "---\ntitle: Omelette\ndescription: Eggs\nservings: 1\n---\n\nbody";

    /// Scriptable repository stub
    struct StubRepository {
        files: Mutex<Vec<(RepoFile, String)>>,
        fail_listing: Mutex<bool>,
        list_calls: AtomicUsize,
        fetch_calls: AtomicUsize,
        commits: Mutex<Vec<String>>,
    }

    impl StubRepository {
        fn with_files(files: Vec<(&str, &str)>) -> Self {
            let files = files
                .into_iter()
                .map(|(name, content)| {
                    (
                        RepoFile {
                            name: name.to_string(),
                            path: format!("app/recipes/{}", name),
                            sha: format!("sha-{}", name),
                        },
                        content.to_string(),
                    )
                })
                .collect();
            Self {
                files: Mutex::new(files),
                fail_listing: Mutex::new(false),
                list_calls: AtomicUsize::new(0),
                fetch_calls: AtomicUsize::new(0),
                commits: Mutex::new(Vec::new()),
            }
        }

        fn set_failing(&self, failing: bool) {
            *self.fail_listing.lock() = failing;
        }
    }

    #[async_trait]
    impl RecipeRepository for StubRepository {
        async fn list_recipe_files(&self) -> Result<Vec<RepoFile>, UpstreamError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if *self.fail_listing.lock() {
                return Err(UpstreamError::Unavailable("listing down".to_string()));
            }
            Ok(self.files.lock().iter().map(|(f, _)| f.clone()).collect())
        }

        async fn fetch_file(
            &self,
            path: &str,
            validator: Option<&str>,
        ) -> Result<FileFetch, UpstreamError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            let files = self.files.lock();
            let (file, content) = files
                .iter()
                .find(|(f, _)| f.path == path)
                .ok_or_else(|| UpstreamError::NotFound(path.to_string()))?;
            // Validator is the sha here; unchanged sha means unchanged file
            if validator == Some(file.sha.as_str()) {
                return Ok(FileFetch::NotModified);
            }
            Ok(FileFetch::Fetched {
                content: content.clone(),
                sha: file.sha.clone(),
                validator: Some(file.sha.clone()),
            })
        }

        async fn put_file(
            &self,
            path: &str,
            _content: &str,
            message: &str,
            _sha: Option<&str>,
        ) -> Result<CommitInfo, UpstreamError> {
            self.commits.lock().push(message.to_string());
            Ok(CommitInfo {
                sha: format!("commit-{}", path),
                message: message.to_string(),
            })
        }

        async fn delete_file(
            &self,
            path: &str,
            message: &str,
            _sha: &str,
        ) -> Result<CommitInfo, UpstreamError> {
            self.commits.lock().push(message.to_string());
            Ok(CommitInfo {
                sha: format!("commit-{}", path),
                message: message.to_string(),
            })
        }
    }

    fn service(
        repo: Arc<StubRepository>,
    ) -> (RecipeService, Arc<CacheStore<Vec<Recipe>>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(CacheStore::new(
            "recipes",
            Duration::from_secs(3600),
            clock.clone(),
        ));
        let service = RecipeService::new(
            repo,
            store.clone(),
            "app/recipes",
            Duration::from_secs(3600),
            clock.clone(),
        );
        (service, store, clock)
    }

    #[tokio::test]
    async fn test_first_read_is_fresh_second_is_cache() {
        let repo = Arc::new(StubRepository::with_files(vec![
            ("pad-thai.md", PAD_THAI_MD),
            ("omelette.md", OMELETTE_MD),
        ]));
        let (service, _store, _clock) = service(repo.clone());

        let first = service.get_all().await.unwrap();
        assert_eq!(first.source, Provenance::Fresh);
        assert_eq!(first.value.len(), 2);

        let second = service.get_all().await.unwrap();
        assert_eq!(second.source, Provenance::Cache);
        assert_eq!(repo.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refetch_after_ttl_uses_file_validators() {
        let repo = Arc::new(StubRepository::with_files(vec![(
            "pad-thai.md",
            PAD_THAI_MD,
        )]));
        let (service, _store, clock) = service(repo.clone());

        service.get_all().await.unwrap();
        let fetches_after_first = repo.fetch_calls.load(Ordering::SeqCst);

        clock.advance(Duration::from_secs(3700));
        let second = service.get_all().await.unwrap();
        assert_eq!(second.source, Provenance::Fresh);
        assert_eq!(second.value.len(), 1);
        // The file was refetched conditionally (one more upstream call,
        // answered not-modified, content reused from the validator cache)
        assert_eq!(
            repo.fetch_calls.load(Ordering::SeqCst),
            fetches_after_first + 1
        );
    }

    #[tokio::test]
    async fn test_failure_serves_stale_list() {
        let repo = Arc::new(StubRepository::with_files(vec![(
            "pad-thai.md",
            PAD_THAI_MD,
        )]));
        let (service, _store, clock) = service(repo.clone());

        service.get_all().await.unwrap();
        clock.advance(Duration::from_secs(3700));
        repo.set_failing(true);

        let resolved = service.get_all().await.unwrap();
        assert_eq!(resolved.source, Provenance::StaleCache);
        assert_eq!(resolved.value.len(), 1);
        assert_eq!(resolved.value[0].name, "Pad Thai");
    }

    #[tokio::test]
    async fn test_failure_with_empty_cache_is_an_error() {
        let repo = Arc::new(StubRepository::with_files(vec![]));
        repo.set_failing(true);
        let (service, _store, _clock) = service(repo);

        let err = service.get_all().await.unwrap_err();
        assert!(err.to_string().contains("listing down"));
    }

    #[tokio::test]
    async fn test_unparseable_files_are_skipped() {
        let repo = Arc::new(StubRepository::with_files(vec![
            ("pad-thai.md", PAD_THAI_MD),
            ("broken.md", "no frontmatter here"),
        ]));
        let (service, _store, _clock) = service(repo);

        let resolved = service.get_all().await.unwrap();
        assert_eq!(resolved.value.len(), 1);
        assert_eq!(resolved.value[0].slug, "pad-thai");
    }

    #[tokio::test]
    async fn test_create_commits_and_invalidates() {
        let repo = Arc::new(StubRepository::with_files(vec![(
            "pad-thai.md",
            PAD_THAI_MD,
        )]));
        let (service, store, _clock) = service(repo.clone());

        service.get_all().await.unwrap();
        assert!(store.has(RECIPE_CACHE_KEY));
        let version_before = store.version();

        let recipe = markdown::parse_recipe("omelette", OMELETTE_MD).unwrap();
        let commit = service.create(&recipe).await.unwrap();
        assert_eq!(commit.message, "Add recipe: Omelette");
        assert_eq!(repo.commits.lock().len(), 1);

        // The cached list is gone and the generation advanced
        assert!(!store.has(RECIPE_CACHE_KEY));
        assert_eq!(store.version(), version_before + 1);
    }

    #[tokio::test]
    async fn test_update_fetches_sha_first() {
        let repo = Arc::new(StubRepository::with_files(vec![(
            "pad-thai.md",
            PAD_THAI_MD,
        )]));
        let (service, _store, _clock) = service(repo.clone());

        let recipe = markdown::parse_recipe("pad-thai", PAD_THAI_MD).unwrap();
        let commit = service.update(&recipe).await.unwrap();
        assert_eq!(commit.message, "Update recipe: Pad Thai");
    }

    #[tokio::test]
    async fn test_delete_missing_recipe_propagates_not_found() {
        let repo = Arc::new(StubRepository::with_files(vec![]));
        let (service, _store, _clock) = service(repo);

        let err = service.delete("ghost").await.unwrap_err();
        assert!(matches!(err, UpstreamError::NotFound(_)));
    }
}
