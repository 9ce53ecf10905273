use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::sync::Mutex;

use sb_core::{Cue, Habit, HabitId, HabitKind, Moment, Progress, SkillBook, SkillIcon};
use sb_store::DataDir;

#[derive(Clone)]
pub struct SbServer {
    state: Arc<Mutex<ServerState>>,
    tool_router: ToolRouter<Self>,
}

struct ServerState {
    book: SkillBook,
    data: DataDir,
}

impl ServerState {
    /// The CLI may write the same profile while the server runs, so every
    /// tool call starts from what is on disk.
    fn reload(&mut self) -> Result<(), McpError> {
        self.book = self.data.store().load_book().map_err(store_error)?;
        Ok(())
    }

    fn resolve(&self, skill: &str) -> Result<HabitId, McpError> {
        self.book
            .resolve(skill)
            .map(|habit| habit.id.clone())
            .map_err(|e| McpError::invalid_params(e.to_string(), None))
    }

    fn persist(&self, habit: &Habit, op: &str) -> Result<(), McpError> {
        self.data.store().save_habit(habit).map_err(|e| {
            tracing::error!("failed to persist after {op}: {e}");
            store_error(e)
        })
    }
}

impl SbServer {
    pub fn new(data: DataDir) -> sb_store::Result<Self> {
        let book = data.store().load_book()?;
        tracing::info!(skills = book.len(), "loaded skill book");
        Ok(Self {
            state: Arc::new(Mutex::new(ServerState { book, data })),
            tool_router: Self::tool_router(),
        })
    }

    /// Flush the WAL before the process exits.
    pub async fn checkpoint_wal(&self) {
        let state = self.state.lock().await;
        match state.data.store().checkpoint_truncate() {
            Ok(()) => tracing::info!("WAL checkpoint complete"),
            Err(e) => tracing::warn!("WAL checkpoint failed: {e}"),
        }
    }

    fn habit_json(habit: &Habit, now: &Moment) -> serde_json::Value {
        serde_json::json!({
            "id": habit.id,
            "name": habit.name,
            "icon": habit.icon,
            "kind": habit.kind,
            "level": habit.level,
            "experience": habit.experience,
            "experienceToNext": habit.experience_to_next,
            "streak": habit.streak,
            "completedToday": habit.is_completed_today(now.day),
            "timerRunning": habit.is_timer_running(),
            "timeTodayMs": habit.time_today_ms,
        })
    }

    fn progress_json(progress: &Progress, cues: &[Cue], now: &Moment) -> serde_json::Value {
        serde_json::json!({
            "skill": Self::habit_json(&progress.habit, now),
            "experienceGained": progress.experience_gained,
            "leveledUpTo": progress.leveled_up_to,
            "streakMilestone": progress.streak_milestone,
            "cues": cues,
        })
    }

    fn stats_json(book: &SkillBook) -> serde_json::Value {
        serde_json::json!({
            "skills": book.len(),
            "totalLevel": book.total_level(),
            "totalExperience": book.total_experience(),
            "bestStreak": book.best_streak(),
            "runningTimers": book.running_timers().count(),
        })
    }
}

fn ok_json(value: &serde_json::Value) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(value).unwrap_or_default(),
    )]))
}

fn engine_error(e: sb_core::EngineError) -> McpError {
    McpError::invalid_params(e.to_string(), None)
}

fn store_error(e: sb_store::StoreError) -> McpError {
    McpError::internal_error(e.to_string(), None)
}

// --- Tool parameter types ---

#[derive(Debug, Deserialize, JsonSchema)]
struct AddRequest {
    /// Display name of the new skill
    name: String,
    /// "daily" (one check-in per day, the default) or "timed" (tracked by a timer)
    kind: Option<String>,
    /// Skill icon label such as "Agility" or "Cooking"
    icon: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SkillRequest {
    /// Skill id, exact name (case-insensitive), or unique id prefix
    skill: String,
}

#[tool_router]
impl SbServer {
    #[tool(description = "List every skill with its level, experience, streak and today's status.")]
    async fn sb_list(&self) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        state.reload()?;
        let now = Moment::now_local();
        let skills: Vec<serde_json::Value> = state
            .book
            .habits()
            .iter()
            .map(|h| Self::habit_json(h, &now))
            .collect();
        ok_json(&serde_json::json!({
            "skills": skills,
            "focus": state.book.focus_ids(),
            "stats": Self::stats_json(&state.book),
        }))
    }

    #[tool(description = "Add a new skill at level 1. Daily skills are completed once per day; timed skills earn experience per minute of tracked time.")]
    async fn sb_add(
        &self,
        Parameters(req): Parameters<AddRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind = match req.kind.as_deref() {
            None => HabitKind::Daily,
            Some(raw) => HabitKind::parse(raw).ok_or_else(|| {
                McpError::invalid_params(format!("kind must be 'daily' or 'timed', got '{raw}'"), None)
            })?,
        };
        let icon = match req.icon.as_deref() {
            None => SkillIcon::default(),
            Some(raw) => raw
                .parse::<SkillIcon>()
                .map_err(|e| McpError::invalid_params(e, None))?,
        };

        let mut state = self.state.lock().await;
        state.reload()?;
        let habit = state
            .book
            .create(&req.name, icon, kind)
            .map_err(engine_error)?
            .clone();
        state.persist(&habit, "add")?;

        ok_json(&Self::habit_json(&habit, &Moment::now_local()))
    }

    #[tool(description = "Complete a daily skill for today. Completing twice on the same day awards nothing.")]
    async fn sb_complete(
        &self,
        Parameters(req): Parameters<SkillRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        state.reload()?;
        let now = Moment::now_local();
        let id = state.resolve(&req.skill)?;

        let progress = state.book.complete(&id, &now).map_err(engine_error)?;
        let cues = if progress.is_noop() {
            Vec::new()
        } else {
            state.persist(&progress.habit, "complete")?;
            Cue::for_completion(&progress)
        };

        ok_json(&Self::progress_json(&progress, &cues, &now))
    }

    #[tool(description = "Start the timer of a timed skill.")]
    async fn sb_start_timer(
        &self,
        Parameters(req): Parameters<SkillRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        state.reload()?;
        let now = Moment::now_local();
        let id = state.resolve(&req.skill)?;

        let habit = state
            .book
            .start_timer(&id, &now)
            .map_err(engine_error)?
            .clone();
        state.persist(&habit, "start_timer")?;

        ok_json(&serde_json::json!({
            "skill": Self::habit_json(&habit, &now),
            "cues": [Cue::TimerStart],
        }))
    }

    #[tool(description = "Stop the timer of a timed skill and bank the experience earned while it ran.")]
    async fn sb_stop_timer(
        &self,
        Parameters(req): Parameters<SkillRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        state.reload()?;
        let now = Moment::now_local();
        let id = state.resolve(&req.skill)?;

        let progress = state.book.stop_timer(&id, &now).map_err(engine_error)?;
        state.persist(&progress.habit, "stop_timer")?;

        ok_json(&Self::progress_json(
            &progress,
            &Cue::for_timer_stop(&progress),
            &now,
        ))
    }

    #[tool(description = "Experience a running timer would award if stopped now. Does not change anything.")]
    async fn sb_pending(
        &self,
        Parameters(req): Parameters<SkillRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        state.reload()?;
        let now = Moment::now_local();
        let id = state.resolve(&req.skill)?;

        let pending = state
            .book
            .pending_experience(&id, &now)
            .map_err(engine_error)?;
        let elapsed_ms = state
            .book
            .get(&id)
            .and_then(|h| h.timer_started_at)
            .map(|start| now.elapsed_ms_since(start))
            .unwrap_or(0);

        ok_json(&serde_json::json!({
            "skill": id,
            "pendingExperience": pending,
            "elapsedMs": elapsed_ms,
        }))
    }

    #[tool(description = "Delete a skill and its history permanently.")]
    async fn sb_delete(
        &self,
        Parameters(req): Parameters<SkillRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        state.reload()?;
        let id = state.resolve(&req.skill)?;

        state.data.store().delete_habit(&id).map_err(|e| {
            tracing::error!("failed to persist after delete: {e}");
            store_error(e)
        })?;
        let removed = state.book.remove(&id);

        ok_json(&serde_json::json!({
            "deleted": removed.map(|h| h.name),
            "stats": Self::stats_json(&state.book),
        }))
    }

    #[tool(description = "Totals for the profile: skill count, total level, total experience, best streak.")]
    async fn sb_stats(&self) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        state.reload()?;
        let mut stats = Self::stats_json(&state.book);
        stats["profile"] = serde_json::Value::from(state.data.profile());
        ok_json(&stats)
    }
}

#[tool_handler]
impl ServerHandler for SbServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Skill book: habits tracked as skills that level from 1 to 99.\n\n\
                 - Call sb_list first to see skills and what is still open today.\n\
                 - Daily skills: call sb_complete once per day.\n\
                 - Timed skills: sb_start_timer, then sb_stop_timer; sb_pending previews the reward.\n\
                 - Skills are addressed by id, name (any case) or a unique id prefix.\n\
                 - When a result carries leveledUpTo, tell the user they advanced a level."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
