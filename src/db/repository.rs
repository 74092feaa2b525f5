//! SQLite repository for games, outcome accumulators and user profiles.

use chrono::Utc;
use diesel::connection::SimpleConnection;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_migrations::MigrationHarness;
use tracing::{debug, info, instrument, warn};

use crate::db::models::encode_board;
use crate::db::{
    DbError, Game, GameId, GameOutcome, GameRecord, GameUpdate, LeaderboardEntry, MIGRATIONS,
    NewGame, NewGameRecord, NewStatistics, NewUser, SessionStore, Statistics, UpdateResult, User,
    UserId, schema,
};
use crate::games::tictactoe::{GameStatus, Side};

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Database repository for game sessions, statistics and users.
#[derive(Debug, Clone)]
pub struct GameRepository {
    db_path: String,
}

impl GameRepository {
    /// Creates a new repository for the SQLite database at the given path.
    ///
    /// A connection is opened per operation, so the path must name a file.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new("Database path is empty"));
        }
        info!(path = %db_path, "Creating GameRepository");
        Ok(Self { db_path })
    }

    /// Returns the database path.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))?;
        conn.batch_execute(&format!("PRAGMA busy_timeout = {};", BUSY_TIMEOUT_MS))?;
        Ok(conn)
    }

    /// Applies all pending embedded migrations, returning how many ran.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        let applied = conn.run_pending_migrations(MIGRATIONS)?;
        info!(count = applied.len(), "Migrations applied");
        Ok(applied.len())
    }

    /// Creates a new user profile.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the display name is already taken or a database error occurs.
    #[instrument(skip(self))]
    pub fn create_user(&self, display_name: String) -> Result<User, DbError> {
        debug!(display_name = %display_name, "Creating user");
        let mut conn = self.connection()?;

        let user = diesel::insert_into(schema::users::table)
            .values(&NewUser::new(display_name))
            .returning(User::as_returning())
            .get_result(&mut conn)?;

        info!(user_id = user.id(), display_name = %user.display_name(), "User created");
        Ok(user)
    }

    /// Gets a user by display name. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_user_by_name(&self, display_name: &str) -> Result<Option<User>, DbError> {
        let mut conn = self.connection()?;
        let user = schema::users::table
            .filter(schema::users::display_name.eq(display_name))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;
        debug!(found = user.is_some(), "User lookup by name");
        Ok(user)
    }

    /// Returns the profile with this display name, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_or_create_user(&self, display_name: String) -> Result<User, DbError> {
        if let Some(user) = self.get_user_by_name(&display_name)? {
            debug!(user_id = user.id(), "Found existing user");
            return Ok(user);
        }
        self.create_user(display_name)
    }

    /// Lists all users ordered by creation.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_users(&self) -> Result<Vec<User>, DbError> {
        let mut conn = self.connection()?;
        let users = schema::users::table
            .order(schema::users::id.asc())
            .select(User::as_select())
            .load(&mut conn)?;
        debug!(count = users.len(), "Users listed");
        Ok(users)
    }
}

/// Conditional update on an open connection.
fn update_game_on(conn: &mut SqliteConnection, update: &GameUpdate) -> Result<UpdateResult, DbError> {
    use schema::games::dsl;

    let expected = encode_board(&update.expected_board)?;
    let board = encode_board(&update.board)?;
    let result = GameOutcome::from_status(update.status).map(|o| o.to_db_string().to_string());

    let updated = diesel::update(
        dsl::games
            .filter(dsl::id.eq(update.game_id))
            .filter(dsl::user_id.eq(update.user_id))
            .filter(dsl::board.eq(expected))
            .filter(dsl::status.eq(GameStatus::InProgress.to_db_string())),
    )
    .set((
        dsl::board.eq(board),
        dsl::status.eq(update.status.to_db_string()),
        dsl::result.eq(result),
        dsl::last_move.eq(update.last_move.map(|p| p.to_index() as i32)),
        dsl::updated_at.eq(Utc::now().naive_utc()),
    ))
    .returning(GameRecord::as_returning())
    .get_result(conn)
    .optional()?;

    if let Some(record) = updated {
        debug!(status = update.status.to_db_string(), "Game updated");
        return Ok(UpdateResult::Applied(record.into_game()?));
    }

    let exists: i64 = dsl::games
        .filter(dsl::id.eq(update.game_id))
        .filter(dsl::user_id.eq(update.user_id))
        .count()
        .get_result(conn)?;

    if exists > 0 {
        warn!("Game changed since it was read; update skipped");
        Ok(UpdateResult::Stale)
    } else {
        debug!("Game not found for user");
        Ok(UpdateResult::NotFound)
    }
}

/// Creates the accumulator row if absent and returns it.
fn ensure_accumulator_on(conn: &mut SqliteConnection, user_id: UserId) -> Result<Statistics, DbError> {
    use schema::statistics::dsl;

    let inserted = diesel::insert_or_ignore_into(dsl::statistics)
        .values(&NewStatistics::new(user_id))
        .execute(conn)?;
    if inserted > 0 {
        info!(user_id, "Accumulator created");
    }

    Ok(dsl::statistics
        .filter(dsl::user_id.eq(user_id))
        .select(Statistics::as_select())
        .first(conn)?)
}

/// Counts one finished game on an open connection.
fn record_outcome_on(
    conn: &mut SqliteConnection,
    user_id: UserId,
    outcome: GameOutcome,
) -> Result<Statistics, DbError> {
    use schema::statistics::dsl;

    ensure_accumulator_on(conn, user_id)?;

    let now = Utc::now().naive_utc();
    let target = dsl::statistics.filter(dsl::user_id.eq(user_id));
    let stats = match outcome {
        GameOutcome::Win => diesel::update(target)
            .set((
                dsl::wins.eq(dsl::wins + 1),
                dsl::total_games.eq(dsl::total_games + 1),
                dsl::updated_at.eq(now),
            ))
            .returning(Statistics::as_returning())
            .get_result(conn)?,
        GameOutcome::Loss => diesel::update(target)
            .set((
                dsl::losses.eq(dsl::losses + 1),
                dsl::total_games.eq(dsl::total_games + 1),
                dsl::updated_at.eq(now),
            ))
            .returning(Statistics::as_returning())
            .get_result(conn)?,
        GameOutcome::Draw => diesel::update(target)
            .set((
                dsl::draws.eq(dsl::draws + 1),
                dsl::total_games.eq(dsl::total_games + 1),
                dsl::updated_at.eq(now),
            ))
            .returning(Statistics::as_returning())
            .get_result(conn)?,
    };

    info!(
        user_id,
        outcome = outcome.to_db_string(),
        total_games = stats.total_games(),
        "Outcome recorded"
    );
    Ok(stats)
}

impl SessionStore for GameRepository {
    #[instrument(skip(self, game), fields(user_id = game.user_id, starter = %game.starter))]
    fn create_game(&self, game: &NewGame) -> Result<Game, DbError> {
        let mut conn = self.connection()?;
        let record = NewGameRecord::from_new_game(game)?;

        let created = diesel::insert_into(schema::games::table)
            .values(&record)
            .returning(GameRecord::as_returning())
            .get_result(&mut conn)?
            .into_game()?;

        info!(game_id = created.id(), "Game created");
        Ok(created)
    }

    #[instrument(skip(self))]
    fn latest_game(&self, user_id: UserId) -> Result<Option<Game>, DbError> {
        use schema::games::dsl;

        let mut conn = self.connection()?;
        let record = dsl::games
            .filter(dsl::user_id.eq(user_id))
            .order(dsl::id.desc())
            .select(GameRecord::as_select())
            .first(&mut conn)
            .optional()?;

        debug!(found = record.is_some(), "Latest game lookup");
        record.map(GameRecord::into_game).transpose()
    }

    #[instrument(skip(self))]
    fn game(&self, user_id: UserId, game_id: GameId) -> Result<Option<Game>, DbError> {
        use schema::games::dsl;

        let mut conn = self.connection()?;
        let record = dsl::games
            .filter(dsl::id.eq(game_id))
            .filter(dsl::user_id.eq(user_id))
            .select(GameRecord::as_select())
            .first(&mut conn)
            .optional()?;

        debug!(found = record.is_some(), "Game lookup");
        record.map(GameRecord::into_game).transpose()
    }

    #[instrument(skip(self, update), fields(user_id = update.user_id, game_id = update.game_id))]
    fn update_game(&self, update: &GameUpdate) -> Result<UpdateResult, DbError> {
        let mut conn = self.connection()?;
        update_game_on(&mut conn, update)
    }

    #[instrument(skip(self))]
    fn ensure_accumulator(&self, user_id: UserId) -> Result<Statistics, DbError> {
        let mut conn = self.connection()?;
        ensure_accumulator_on(&mut conn, user_id)
    }

    #[instrument(skip(self))]
    fn record_outcome(
        &self,
        user_id: UserId,
        outcome: GameOutcome,
    ) -> Result<Statistics, DbError> {
        let mut conn = self.connection()?;
        conn.immediate_transaction(|conn| record_outcome_on(conn, user_id, outcome))
    }

    #[instrument(skip(self, update), fields(user_id = update.user_id, game_id = update.game_id))]
    fn finish_game(
        &self,
        update: &GameUpdate,
        outcome: GameOutcome,
    ) -> Result<UpdateResult, DbError> {
        let mut conn = self.connection()?;
        conn.immediate_transaction(|conn| {
            let result = update_game_on(conn, update)?;
            if let UpdateResult::Applied(_) = result {
                record_outcome_on(conn, update.user_id, outcome)?;
            }
            Ok(result)
        })
    }

    #[instrument(skip(self))]
    fn recent_games(&self, user_id: UserId, limit: i64) -> Result<Vec<Game>, DbError> {
        use schema::games::dsl;

        let mut conn = self.connection()?;
        let records = dsl::games
            .filter(dsl::user_id.eq(user_id))
            .order(dsl::id.desc())
            .limit(limit)
            .select(GameRecord::as_select())
            .load(&mut conn)?;

        debug!(count = records.len(), "Recent games loaded");
        records.into_iter().map(GameRecord::into_game).collect()
    }

    #[instrument(skip(self))]
    fn recent_outcomes(&self, user_id: UserId, limit: i64) -> Result<Vec<GameOutcome>, DbError> {
        use schema::games::dsl;

        let mut conn = self.connection()?;
        let results: Vec<Option<String>> = dsl::games
            .filter(dsl::user_id.eq(user_id))
            .filter(dsl::result.is_not_null())
            .order(dsl::id.desc())
            .limit(limit)
            .select(dsl::result)
            .load(&mut conn)?;

        results
            .iter()
            .flatten()
            .map(|s| GameOutcome::from_db_string(s))
            .collect()
    }

    #[instrument(skip(self))]
    fn outcomes_by_starter(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(Side, GameOutcome, i64)>, DbError> {
        use schema::games::dsl;

        let mut conn = self.connection()?;
        let rows: Vec<(String, Option<String>, i64)> = dsl::games
            .filter(dsl::user_id.eq(user_id))
            .filter(dsl::result.is_not_null())
            .group_by((dsl::starter, dsl::result))
            .select((dsl::starter, dsl::result, count_star()))
            .load(&mut conn)?;

        let mut grouped = Vec::with_capacity(rows.len());
        for (starter, result, count) in rows {
            let Some(result) = result else { continue };
            let side: Side = starter
                .parse()
                .map_err(|_| DbError::new(format!("Invalid starter: '{}'", starter)))?;
            grouped.push((side, GameOutcome::from_db_string(&result)?, count));
        }
        Ok(grouped)
    }

    #[instrument(skip(self))]
    fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, DbError> {
        use schema::{statistics, users};

        let mut conn = self.connection()?;
        let rows: Vec<(Statistics, Option<String>)> = statistics::table
            .left_join(users::table)
            .filter(statistics::total_games.ge(1))
            .select((Statistics::as_select(), users::display_name.nullable()))
            .load(&mut conn)?;

        let mut entries: Vec<LeaderboardEntry> = rows
            .iter()
            .map(|(stats, name)| {
                let name = name
                    .clone()
                    .unwrap_or_else(|| format!("Player {}", stats.user_id()));
                LeaderboardEntry::from_statistics(stats, name)
            })
            .collect();

        entries.sort_by(|a, b| {
            b.win_percentage()
                .total_cmp(a.win_percentage())
                .then_with(|| b.wins().cmp(a.wins()))
                .then_with(|| a.user_id().cmp(b.user_id()))
        });

        let ranked: Vec<LeaderboardEntry> = entries
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .enumerate()
            .map(|(i, entry)| entry.ranked(i + 1))
            .collect();

        info!(count = ranked.len(), "Leaderboard computed");
        Ok(ranked)
    }
}
