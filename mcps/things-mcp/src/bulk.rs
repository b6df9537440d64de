//! Bulk orchestration
//!
//! Every bulk call follows the same pipeline:
//!
//! 1. validate the whole request (nothing runs on failure)
//! 2. return the stored result if the idempotency key was already used
//! 3. run one native batch script and align its tokens with the input items
//! 4. on any host failure, redo the batch item by item
//! 5. store the result under the key
//!
//! Callers always get either a [`BatchResult`] whose outcome list has one entry
//! per input item, or a rejection message.

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::cache::{CacheError, IdempotencyStore};
use crate::client::ThingsClient;
use crate::types::{
    BatchResult, BulkFamily, BulkResponse, CachedBatch, ClientRecord, ItemOutcome, NewTodo,
    ThingsError, TodoUpdate,
};
use crate::validation::{
    parse_moves, parse_new_todos, parse_todo_ids, parse_updates, validate_batch,
};

/// Runs bulk operations against Things 3 with idempotency
#[derive(Clone)]
pub struct BulkOrchestrator {
    client: ThingsClient,
    create_cache: Arc<dyn IdempotencyStore>,
    cache: Arc<dyn IdempotencyStore>,
}

impl BulkOrchestrator {
    /// `create_cache` holds the create family, `cache` every other family
    pub fn new(
        client: ThingsClient,
        create_cache: Arc<dyn IdempotencyStore>,
        cache: Arc<dyn IdempotencyStore>,
    ) -> Self {
        Self {
            client,
            create_cache,
            cache,
        }
    }

    pub fn client(&self) -> &ThingsClient {
        &self.client
    }

    fn store(&self, family: BulkFamily) -> &dyn IdempotencyStore {
        match family {
            BulkFamily::Create => self.create_cache.as_ref(),
            _ => self.cache.as_ref(),
        }
    }

    /// Stored result for a key. A failing store counts as a miss.
    fn cached(&self, family: BulkFamily, key: &str) -> Option<BatchResult> {
        match self.store(family).get(family, key) {
            Ok(Some(entry)) => {
                info!(family = %family, key, "Returning cached bulk result");
                Some(entry.batch)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(family = %family, key, error = %e, "Idempotency cache read failed");
                None
            }
        }
    }

    fn remember(&self, family: BulkFamily, key: &str, entry: &CachedBatch) {
        if let Err(e) = self.store(family).set(family, key, entry) {
            warn!(family = %family, key, error = %e, "Idempotency cache write failed");
        }
    }

    fn finish(&self, family: BulkFamily, key: &str, outcomes: Vec<ItemOutcome>) -> BulkResponse {
        let batch = BatchResult::from_outcomes(outcomes);
        self.remember(family, key, &CachedBatch::new(batch.clone()));
        log_batch(family, &batch);
        BulkResponse::Batch(batch)
    }

    /// Ensure the host is up, run one batch script and split its output
    async fn run_batch(
        &self,
        family: BulkFamily,
        script: &str,
        count: usize,
    ) -> Result<Vec<String>, ThingsError> {
        self.client.ensure_running().await?;
        let output = self.client.run(script).await?;
        split_tokens(family, &output, count)
    }

    // ========================================================================
    // Create
    // ========================================================================

    #[instrument(skip(self, items))]
    pub async fn create_todo_bulk(&self, idempotency_key: &str, items: &Value) -> BulkResponse {
        let family = BulkFamily::Create;
        let todos = match validate_batch(items, idempotency_key).and_then(parse_new_todos) {
            Ok(todos) => todos,
            Err(message) => return BulkResponse::rejected(message),
        };
        if let Some(batch) = self.cached(family, idempotency_key) {
            return BulkResponse::Batch(batch);
        }

        let script = self.client.scripts().batch_create_script(&todos);
        let outcomes = match self.run_batch(family, &script, todos.len()).await {
            Ok(tokens) => {
                let outcomes = align(family, &tokens, todos.len(), |_, token| token.to_string());
                self.finish_created(&todos, &outcomes).await;
                outcomes
            }
            Err(e) => {
                warn!(error = %e, "Native batch create failed, falling back to single creates");
                each(&todos, |todo| self.client.create_todo(todo)).await
            }
        };

        let batch = BatchResult::from_outcomes(outcomes);
        let mut entry = CachedBatch::new(batch.clone());
        for (todo, outcome) in todos.iter().zip(&batch.results) {
            if let Some(client_id) = &todo.client_id {
                entry.clients.insert(
                    client_id.clone(),
                    ClientRecord {
                        id: outcome.id.clone(),
                        error: outcome.error.clone(),
                    },
                );
            }
        }
        self.remember(family, idempotency_key, &entry);
        log_batch(family, &batch);
        BulkResponse::Batch(batch)
    }

    /// Scheduling and tagging for todos the batch script created
    async fn finish_created(&self, todos: &[NewTodo], outcomes: &[ItemOutcome]) {
        for (todo, outcome) in todos.iter().zip(outcomes) {
            let Some(todo_id) = &outcome.id else {
                continue;
            };
            if let Some(when) = todo.when.filter(|w| !w.is_someday()) {
                self.client.apply_when(todo_id, when).await;
            }
            self.client.apply_tags(todo_id, &todo.tags).await;
        }
    }

    /// What a `client_id` in a previous create batch resolved to
    pub fn lookup_client(&self, idempotency_key: &str, client_id: &str) -> Option<ClientRecord> {
        match self
            .create_cache
            .client_record(BulkFamily::Create, idempotency_key, client_id)
        {
            Ok(record) => record,
            Err(e) => {
                warn!(key = idempotency_key, error = %e, "Client id lookup failed");
                None
            }
        }
    }

    /// Forget every stored result of one family
    pub fn clear_cache(&self, family: BulkFamily) -> Result<(), CacheError> {
        self.store(family).clear(family)?;
        info!(family = %family, "Cleared idempotency cache");
        Ok(())
    }

    // ========================================================================
    // Update and Move
    // ========================================================================

    #[instrument(skip(self, items))]
    pub async fn update_todo_bulk(&self, idempotency_key: &str, items: &Value) -> BulkResponse {
        let family = BulkFamily::Update;
        let updates = match validate_batch(items, idempotency_key).and_then(parse_updates) {
            Ok(updates) => updates,
            Err(message) => return BulkResponse::rejected(message),
        };
        if let Some(batch) = self.cached(family, idempotency_key) {
            return BulkResponse::Batch(batch);
        }

        let script = self.client.scripts().batch_update_script(&updates);
        let outcomes = match self.run_batch(family, &script, updates.len()).await {
            Ok(tokens) => {
                let outcomes = align(family, &tokens, updates.len(), |i, _| {
                    updates[i].todo_id.clone()
                });
                self.finish_updated(&updates, &outcomes).await;
                outcomes
            }
            Err(e) => {
                warn!(error = %e, "Native batch update failed, falling back to single updates");
                each(&updates, |update| async move {
                    self.client
                        .update_todo(update)
                        .await
                        .map(|_| update.todo_id.clone())
                })
                .await
            }
        };
        self.finish(family, idempotency_key, outcomes)
    }

    async fn finish_updated(&self, updates: &[TodoUpdate], outcomes: &[ItemOutcome]) {
        for (update, outcome) in updates.iter().zip(outcomes) {
            if !outcome.is_success() {
                continue;
            }
            if let Some(when) = update.when {
                self.client.apply_when(&update.todo_id, when).await;
            }
            self.client.apply_tags(&update.todo_id, &update.tags).await;
        }
    }

    #[instrument(skip(self, items))]
    pub async fn move_todo_bulk(&self, idempotency_key: &str, items: &Value) -> BulkResponse {
        let family = BulkFamily::Move;
        let moves = match validate_batch(items, idempotency_key).and_then(parse_moves) {
            Ok(moves) => moves,
            Err(message) => return BulkResponse::rejected(message),
        };
        if let Some(batch) = self.cached(family, idempotency_key) {
            return BulkResponse::Batch(batch);
        }

        let script = self.client.scripts().batch_move_script(&moves);
        let outcomes = match self.run_batch(family, &script, moves.len()).await {
            Ok(tokens) => align(family, &tokens, moves.len(), |i, _| moves[i].todo_id.clone()),
            Err(e) => {
                warn!(error = %e, "Native batch move failed, falling back to single moves");
                each(&moves, |mv| async move {
                    self.client.move_todo(mv).await.map(|_| mv.todo_id.clone())
                })
                .await
            }
        };
        self.finish(family, idempotency_key, outcomes)
    }

    // ========================================================================
    // Identifier-only Families
    // ========================================================================

    #[instrument(skip(self, items))]
    pub async fn complete_todo_bulk(&self, idempotency_key: &str, items: &Value) -> BulkResponse {
        self.id_batch(BulkFamily::Complete, idempotency_key, items)
            .await
    }

    #[instrument(skip(self, items))]
    pub async fn cancel_todo_bulk(&self, idempotency_key: &str, items: &Value) -> BulkResponse {
        self.id_batch(BulkFamily::Cancel, idempotency_key, items)
            .await
    }

    #[instrument(skip(self, items))]
    pub async fn delete_todo_bulk(&self, idempotency_key: &str, items: &Value) -> BulkResponse {
        self.id_batch(BulkFamily::Delete, idempotency_key, items)
            .await
    }

    async fn id_batch(&self, family: BulkFamily, idempotency_key: &str, items: &Value) -> BulkResponse {
        let todo_ids = match validate_batch(items, idempotency_key).and_then(parse_todo_ids) {
            Ok(ids) => ids,
            Err(message) => return BulkResponse::rejected(message),
        };
        if let Some(batch) = self.cached(family, idempotency_key) {
            return BulkResponse::Batch(batch);
        }

        let scripts = self.client.scripts();
        let script = match family {
            BulkFamily::Complete => scripts.batch_complete_script(&todo_ids),
            BulkFamily::Cancel => scripts.batch_cancel_script(&todo_ids),
            _ => scripts.batch_delete_script(&todo_ids),
        };

        let outcomes = match self.run_batch(family, &script, todo_ids.len()).await {
            Ok(tokens) => align(family, &tokens, todo_ids.len(), |i, _| todo_ids[i].clone()),
            Err(e) => {
                warn!(family = %family, error = %e, "Native batch failed, falling back to single operations");
                each(&todo_ids, |todo_id| async move {
                    let result = match family {
                        BulkFamily::Complete => self.client.complete_todo(todo_id).await,
                        BulkFamily::Cancel => self.client.cancel_todo(todo_id).await,
                        _ => self.client.delete_todo(todo_id).await,
                    };
                    result.map(|_| todo_id.clone())
                })
                .await
            }
        };
        self.finish(family, idempotency_key, outcomes)
    }
}

/// Split batch output into one token per item.
///
/// Fewer tokens than items is tolerated (the caller backfills). More tokens
/// than items means a name contained the delimiter, so positions can no longer
/// be trusted; for name-returning families that is a parse failure. Created
/// ids never contain the delimiter, so surplus tokens there are dropped rather
/// than risking duplicate creation in the fallback.
fn split_tokens(family: BulkFamily, output: &str, count: usize) -> Result<Vec<String>, ThingsError> {
    let mut tokens: Vec<String> = output
        .split(family.delimiter())
        .map(|token| token.trim().to_string())
        .collect();
    if tokens.len() > count {
        if family != BulkFamily::Create {
            return Err(ThingsError::UnexpectedOutput(format!(
                "{} tokens for {} items",
                tokens.len(),
                count
            )));
        }
        tokens.truncate(count);
    }
    Ok(tokens)
}

/// Pair tokens with item positions; empty or missing tokens become failures
fn align(
    family: BulkFamily,
    tokens: &[String],
    count: usize,
    id_for: impl Fn(usize, &str) -> String,
) -> Vec<ItemOutcome> {
    (0..count)
        .map(|index| match tokens.get(index).filter(|t| !t.is_empty()) {
            Some(token) => ItemOutcome::success(index, id_for(index, token.as_str())),
            None => ItemOutcome::failure(index, family.failure_message()),
        })
        .collect()
}

/// Fallback: run each item on its own, turning errors into failed outcomes
async fn each<'a, T, F, Fut>(items: &'a [T], op: F) -> Vec<ItemOutcome>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = Result<String, ThingsError>>,
{
    let mut outcomes = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        outcomes.push(match op(item).await {
            Ok(id) => ItemOutcome::success(index, id),
            Err(e) => ItemOutcome::failure(index, e.to_string()),
        });
    }
    outcomes
}

fn log_batch(family: BulkFamily, batch: &BatchResult) {
    info!(
        family = %family,
        batch_id = %batch.batch_id,
        processed = batch.processed,
        succeeded = batch.succeeded,
        failed = batch.failed,
        "Bulk batch finished"
    );
}
