//! Application state and event handling.
//!
//! [`App`] owns everything the UI shows: the session, the open project's
//! [`Board`], forms and panels. Key presses and [`NetEvent`]s mutate it and
//! may yield a [`NetCommand`] for the caller to dispatch; the app itself
//! never performs I/O.

use std::collections::{BTreeMap, VecDeque};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use pmt_proto::history::HistoryEntry;
use pmt_proto::project::{Project, ProjectId};
use pmt_proto::task::{Task, TaskId, TaskStatus};
use pmt_proto::user::{Assigned, User, UserId, UsersProject};

use crate::api::ApiError;
use crate::board::{Board, DragDrop, DropOutcome, PendingTransfer};
use crate::forms::{LoginForm, ParticipantList, ProjectForm, SignupForm, TaskForm, TextForm};
use crate::net::{NetCommand, NetEvent};
use crate::session::SessionStore;

/// Which screen is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Credentials form.
    Login,
    /// Account creation form.
    Signup,
    /// Projects of the logged-in user.
    Dashboard,
    /// Kanban board of the open project.
    Board,
    /// One task with its assignees and history.
    TaskDetail,
}

/// A form plus the index of the focused input.
///
/// Inputs are the form's text fields followed by any extra controls the
/// owning modal adds (participant rows, priority).
#[derive(Debug, Clone, Default)]
pub struct FormState<F> {
    /// The form.
    pub form: F,
    /// Focused input.
    pub focus: usize,
}

impl<F: TextForm> FormState<F> {
    /// State focused on the first field.
    pub const fn new(form: F) -> Self {
        Self { form, focus: 0 }
    }

    /// Index of the focused extra control, if focus is past the text fields.
    fn extra_focus(&self) -> Option<usize> {
        self.focus.checked_sub(self.form.labels().len())
    }

    const fn focus_next(&mut self, inputs: usize) {
        if inputs > 0 {
            self.focus = (self.focus + 1) % inputs;
        }
    }

    const fn focus_prev(&mut self, inputs: usize) {
        if inputs > 0 {
            self.focus = (self.focus + inputs - 1) % inputs;
        }
    }

    /// Types into the focused text field. Returns whether the key was used.
    fn edit(&mut self, key: KeyEvent) -> bool {
        let Some(field) = self.form.field_mut(self.focus) else {
            return false;
        };
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                field.push(c);
                true
            }
            KeyCode::Backspace => {
                field.pop();
                true
            }
            _ => false,
        }
    }
}

/// Position of the board cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardCursor {
    /// Column.
    pub column: TaskStatus,
    /// Row within the column. While a task is grabbed and the cursor is in
    /// another column, this may equal the column length ("drop at the end").
    pub index: usize,
}

impl Default for BoardCursor {
    fn default() -> Self {
        Self {
            column: TaskStatus::Todo,
            index: 0,
        }
    }
}

/// A task picked up for a keyboard drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grab {
    /// Task being dragged.
    pub task_id: TaskId,
    /// Column it was picked from.
    pub from: TaskStatus,
}

/// Participants panel of the open project.
#[derive(Debug, Clone)]
pub struct ParticipantsPanel {
    /// Project shown.
    pub project_id: ProjectId,
    /// Current memberships; `None` while loading.
    pub members: Option<UsersProject>,
    /// Selected membership.
    pub selected: usize,
    /// Lines being added.
    pub adding: ParticipantList,
    /// Focused line being added; `None` when the membership list has focus.
    pub adding_focus: Option<usize>,
}

/// Change history of the open project.
#[derive(Debug, Clone)]
pub struct HistoryPanel {
    /// Project shown.
    pub project_id: ProjectId,
    /// Entries; `None` while loading.
    pub entries: Option<Vec<HistoryEntry>>,
    /// First visible entry.
    pub scroll: usize,
}

/// Overlay on top of the current screen.
#[derive(Debug, Clone)]
pub enum Modal {
    /// Create or edit a project.
    Project(FormState<ProjectForm>),
    /// Create or edit a task.
    Task(FormState<TaskForm>),
    /// Manage participants.
    Participants(ParticipantsPanel),
    /// Project history.
    History(HistoryPanel),
}

/// Which list of the task detail view has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailFocus {
    /// Project members that can be assigned.
    Members,
    /// Current assignees.
    Assignees,
}

/// Data of the task detail view.
#[derive(Debug, Clone)]
pub struct TaskDetailData {
    /// The task.
    pub task: Task,
    /// Current assignees.
    pub assignments: Vec<Assigned>,
    /// Changes to the task.
    pub history: Vec<HistoryEntry>,
    /// Project members.
    pub members: Vec<User>,
}

/// Task detail screen state.
#[derive(Debug, Clone)]
pub struct TaskDetailView {
    /// Task shown.
    pub task_id: TaskId,
    /// Its project.
    pub project_id: ProjectId,
    /// Loaded data; `None` while loading.
    pub data: Option<TaskDetailData>,
    /// Focused list.
    pub focus: DetailFocus,
    /// Selected member.
    pub selected_member: usize,
    /// Selected assignee.
    pub selected_assignee: usize,
}

impl TaskDetailView {
    const fn new(task_id: TaskId, project_id: ProjectId) -> Self {
        Self {
            task_id,
            project_id,
            data: None,
            focus: DetailFocus::Members,
            selected_member: 0,
            selected_assignee: 0,
        }
    }

    fn select_next(&mut self) {
        let Some(data) = &self.data else { return };
        match self.focus {
            DetailFocus::Members => {
                self.selected_member = step(self.selected_member, data.members.len(), 1);
            }
            DetailFocus::Assignees => {
                self.selected_assignee = step(self.selected_assignee, data.assignments.len(), 1);
            }
        }
    }

    fn select_prev(&mut self) {
        let Some(data) = &self.data else { return };
        match self.focus {
            DetailFocus::Members => {
                self.selected_member = step(self.selected_member, data.members.len(), -1);
            }
            DetailFocus::Assignees => {
                self.selected_assignee = step(self.selected_assignee, data.assignments.len(), -1);
            }
        }
    }
}

/// Moves `index` by `delta` within `0..len`, saturating at both ends.
const fn step(index: usize, len: usize, delta: isize) -> usize {
    if len == 0 {
        return 0;
    }
    let moved = index.saturating_add_signed(delta);
    if moved >= len { len - 1 } else { moved }
}

/// Main application state.
pub struct App {
    /// Current screen.
    pub screen: Screen,
    /// Overlay, if any.
    pub modal: Option<Modal>,
    /// Notifications waiting to be acknowledged, oldest first.
    pub notices: VecDeque<String>,
    /// Who is logged in.
    pub session: SessionStore,
    /// Login form.
    pub login: FormState<LoginForm>,
    /// Signup form.
    pub signup: FormState<SignupForm>,
    /// Projects of the logged-in user.
    pub projects: Vec<Project>,
    /// Selected project on the dashboard.
    pub selected_project: usize,
    /// Open project.
    pub project: Option<Project>,
    /// Board of the open project.
    pub board: Board,
    /// Board cursor.
    pub cursor: BoardCursor,
    /// Task being dragged.
    pub grab: Option<Grab>,
    /// Task detail screen state.
    pub detail: Option<TaskDetailView>,
    /// Every known user (participant pickers).
    pub users: Vec<User>,
    /// Date display format (chrono).
    pub date_format: String,
    /// Whether the app should quit.
    pub should_quit: bool,
    pending: BTreeMap<u64, PendingTransfer>,
    next_ticket: u64,
}

impl App {
    /// Create the app over a session. A restored identity opens the
    /// dashboard directly.
    #[must_use]
    pub fn new(session: SessionStore) -> Self {
        let screen = if session.is_logged_in() {
            Screen::Dashboard
        } else {
            Screen::Login
        };
        Self {
            screen,
            modal: None,
            notices: VecDeque::new(),
            session,
            login: FormState::default(),
            signup: FormState::default(),
            projects: Vec::new(),
            selected_project: 0,
            project: None,
            board: Board::new(),
            cursor: BoardCursor::default(),
            grab: None,
            detail: None,
            users: Vec::new(),
            date_format: pmt_proto::validate::DATE_FORMAT.to_string(),
            should_quit: false,
            pending: BTreeMap::new(),
            next_ticket: 0,
        }
    }

    /// Set the date display format.
    #[must_use]
    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_format = format.to_string();
        self
    }

    /// Command to send once the network is up.
    #[must_use]
    pub fn startup_command(&self) -> Option<NetCommand> {
        self.user_id().map(NetCommand::LoadProjects)
    }

    /// The logged-in user's id.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.session.current_user().map(|u| u.id)
    }

    /// Notification currently shown.
    #[must_use]
    pub fn current_notice(&self) -> Option<&str> {
        self.notices.front().map(String::as_str)
    }

    /// Number of board transfers awaiting the server.
    #[must_use]
    pub fn pending_transfers(&self) -> usize {
        self.pending.len()
    }

    /// Task under the board cursor.
    #[must_use]
    pub fn selected_task(&self) -> Option<&Task> {
        self.board.get(self.cursor.column, self.cursor.index)
    }

    /// Queue a notification.
    pub fn notify(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(notice = %message, "notice queued");
        self.notices.push_back(message);
    }

    // -----------------------------------------------------------------------
    // Key handling
    // -----------------------------------------------------------------------

    /// Handle a key event. Returns a command when the key needs the network.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<NetCommand> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }

        // A notice blocks everything until acknowledged.
        if self.notices.pop_front().is_some() {
            return None;
        }

        if let Some(modal) = self.modal.take() {
            return self.handle_modal_key(modal, key);
        }

        match self.screen {
            Screen::Login => self.handle_login_key(key),
            Screen::Signup => self.handle_signup_key(key),
            Screen::Dashboard | Screen::Board | Screen::TaskDetail
                if !self.session.is_logged_in() =>
            {
                self.screen = Screen::Login;
                None
            }
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::Board => self.handle_board_key(key),
            Screen::TaskDetail => self.handle_detail_key(key),
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> Option<NetCommand> {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::F(2) => self.screen = Screen::Signup,
            KeyCode::Tab | KeyCode::Down => self.login.focus_next(2),
            KeyCode::BackTab | KeyCode::Up => self.login.focus_prev(2),
            KeyCode::Enter => match self.login.form.submit() {
                Ok(request) => return Some(NetCommand::Login(request)),
                Err(e) => self.notify(e.to_string()),
            },
            _ => {
                self.login.edit(key);
            }
        }
        None
    }

    fn handle_signup_key(&mut self, key: KeyEvent) -> Option<NetCommand> {
        match key.code {
            KeyCode::Esc | KeyCode::F(2) => self.screen = Screen::Login,
            KeyCode::Tab | KeyCode::Down => self.signup.focus_next(4),
            KeyCode::BackTab | KeyCode::Up => self.signup.focus_prev(4),
            KeyCode::Enter => match self.signup.form.submit() {
                Ok(request) => return Some(NetCommand::Signup(request)),
                Err(e) => self.notify(e.to_string()),
            },
            _ => {
                self.signup.edit(key);
            }
        }
        None
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) -> Option<NetCommand> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => {
                self.selected_project = step(self.selected_project, self.projects.len(), 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_project = step(self.selected_project, self.projects.len(), -1);
            }
            KeyCode::Enter => {
                let project = self.projects.get(self.selected_project)?.clone();
                return Some(self.open_project(project));
            }
            KeyCode::Char('n') => {
                let owner = self.session.current_user()?;
                self.modal = Some(Modal::Project(FormState::new(ProjectForm::create(owner))));
                return Some(NetCommand::LoadUsers);
            }
            KeyCode::Char('d') => {
                let project = self.projects.get(self.selected_project)?;
                return Some(NetCommand::DeleteProject(project.id));
            }
            KeyCode::Char('r') => return self.user_id().map(NetCommand::LoadProjects),
            KeyCode::Char('L') => self.logout(),
            _ => {}
        }
        None
    }

    fn handle_board_key(&mut self, key: KeyEvent) -> Option<NetCommand> {
        if key.code == KeyCode::Esc {
            if self.grab.take().is_none() {
                self.close_project();
            }
            return None;
        }
        let project_id = self.project.as_ref()?.id;

        match key.code {
            KeyCode::Char('h') | KeyCode::Left => self.move_column(false),
            KeyCode::Char('l') | KeyCode::Right => self.move_column(true),
            KeyCode::Char('j') | KeyCode::Down => {
                self.cursor.index = (self.cursor.index + 1).min(self.cursor_limit(self.cursor.column));
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.cursor.index = self.cursor.index.saturating_sub(1);
            }
            KeyCode::Char(' ') => return self.grab_or_drop(project_id),
            KeyCode::Char('r') => return Some(NetCommand::LoadProject(project_id)),
            KeyCode::Char('n') if self.grab.is_none() => {
                self.modal = Some(Modal::Task(FormState::new(TaskForm::default())));
            }
            KeyCode::Char('d') if self.grab.is_none() => {
                return self.selected_task().map(|t| NetCommand::DeleteTask(t.id));
            }
            KeyCode::Char('e') if self.grab.is_none() => {
                let form = ProjectForm::edit(self.project.as_ref()?);
                self.modal = Some(Modal::Project(FormState::new(form)));
            }
            KeyCode::Char('p') if self.grab.is_none() => {
                self.modal = Some(Modal::Participants(ParticipantsPanel {
                    project_id,
                    members: None,
                    selected: 0,
                    adding: ParticipantList::default(),
                    adding_focus: None,
                }));
                return Some(NetCommand::LoadParticipants(project_id));
            }
            KeyCode::Char('H') if self.grab.is_none() => {
                self.modal = Some(Modal::History(HistoryPanel {
                    project_id,
                    entries: None,
                    scroll: 0,
                }));
                return Some(NetCommand::LoadProjectHistory(project_id));
            }
            KeyCode::Enter if self.grab.is_none() => {
                let task_id = self.selected_task()?.id;
                self.detail = Some(TaskDetailView::new(task_id, project_id));
                self.screen = Screen::TaskDetail;
                return Some(NetCommand::LoadTaskDetail {
                    task_id,
                    project_id,
                });
            }
            _ => {}
        }
        None
    }

    /// Highest cursor row in `column`: the last task, or one past it while
    /// dragging into another column.
    fn cursor_limit(&self, column: TaskStatus) -> usize {
        let len = self.board.column(column).len();
        match self.grab {
            Some(grab) if grab.from != column => len,
            _ => len.saturating_sub(1),
        }
    }

    fn move_column(&mut self, right: bool) {
        let current = self.cursor.column.column();
        let target = if right {
            TaskStatus::from_column(current + 1)
        } else {
            current.checked_sub(1).and_then(TaskStatus::from_column)
        };
        if let Some(column) = target {
            self.cursor.column = column;
            self.clamp_cursor();
        }
    }

    fn clamp_cursor(&mut self) {
        self.cursor.index = self.cursor.index.min(self.cursor_limit(self.cursor.column));
    }

    /// Space on the board: pick up the task under the cursor, or drop the
    /// one being dragged at the cursor.
    fn grab_or_drop(&mut self, project_id: ProjectId) -> Option<NetCommand> {
        let Some(grab) = self.grab.take() else {
            let task_id = self.selected_task()?.id;
            // One transfer per task at a time: rollback restores from the
            // position captured at drop time.
            if self.pending.values().any(|p| p.task().id == task_id) {
                tracing::debug!(task = %task_id, "grab refused, transfer in flight");
                self.notify("This task is still being saved");
                return None;
            }
            self.grab = Some(Grab {
                task_id,
                from: self.cursor.column,
            });
            return None;
        };

        // Re-read the source position: the board may have changed since
        // the task was picked up.
        let (from, from_index) = self.board.position(grab.task_id)?;
        let drop = DragDrop {
            from,
            from_index,
            to: self.cursor.column,
            to_index: self.cursor.index,
            task_id: grab.task_id,
        };
        let outcome = match self.board.apply(drop) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "drop refused");
                return None;
            }
        };
        self.clamp_cursor();
        match outcome {
            DropOutcome::Reordered => None,
            DropOutcome::Transfer(pending) => {
                let ticket = self.next_ticket;
                self.next_ticket += 1;
                let task = pending.payload(project_id);
                tracing::info!(ticket, task = %task.id, status = %task.status, "transfer sent");
                self.pending.insert(ticket, pending);
                Some(NetCommand::UpdateTask { ticket, task })
            }
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) -> Option<NetCommand> {
        let Some(detail) = self.detail.as_mut() else {
            self.screen = Screen::Board;
            return None;
        };
        match key.code {
            KeyCode::Esc => {
                self.detail = None;
                self.screen = Screen::Board;
            }
            KeyCode::Tab => {
                detail.focus = match detail.focus {
                    DetailFocus::Members => DetailFocus::Assignees,
                    DetailFocus::Assignees => DetailFocus::Members,
                };
            }
            KeyCode::Char('j') | KeyCode::Down => detail.select_next(),
            KeyCode::Char('k') | KeyCode::Up => detail.select_prev(),
            KeyCode::Enter if detail.focus == DetailFocus::Members => {
                let member = detail.data.as_ref()?.members.get(detail.selected_member)?;
                return Some(NetCommand::Assign {
                    task_id: detail.task_id,
                    user_id: member.id,
                });
            }
            KeyCode::Char('x') | KeyCode::Delete if detail.focus == DetailFocus::Assignees => {
                let data = detail.data.as_ref()?;
                let assignment = data.assignments.get(detail.selected_assignee)?;
                return Some(NetCommand::Unassign {
                    task_id: detail.task_id,
                    assignment_id: assignment.id,
                });
            }
            KeyCode::Char('e') => {
                let form = TaskForm::edit(&detail.data.as_ref()?.task);
                self.modal = Some(Modal::Task(FormState::new(form)));
            }
            KeyCode::Char('d') => return Some(NetCommand::DeleteTask(detail.task_id)),
            KeyCode::Char('r') => {
                return Some(NetCommand::LoadTaskDetail {
                    task_id: detail.task_id,
                    project_id: detail.project_id,
                });
            }
            _ => {}
        }
        None
    }

    // -----------------------------------------------------------------------
    // Modals
    // -----------------------------------------------------------------------

    fn handle_modal_key(&mut self, mut modal: Modal, key: KeyEvent) -> Option<NetCommand> {
        if key.code == KeyCode::Esc {
            return None;
        }
        let command = match &mut modal {
            Modal::Project(state) => self.project_form_key(state, key),
            Modal::Task(state) => self.task_form_key(state, key),
            Modal::Participants(panel) => self.participants_key(panel, key),
            Modal::History(panel) => {
                let len = panel.entries.as_ref().map_or(0, Vec::len);
                match key.code {
                    KeyCode::Char('j') | KeyCode::Down => panel.scroll = step(panel.scroll, len, 1),
                    KeyCode::Char('k') | KeyCode::Up => panel.scroll = step(panel.scroll, len, -1),
                    _ => {}
                }
                None
            }
        };
        self.modal = Some(modal);
        command
    }

    fn project_form_key(
        &mut self,
        state: &mut FormState<ProjectForm>,
        key: KeyEvent,
    ) -> Option<NetCommand> {
        let fields = state.form.labels().len();
        let creating = state.form.editing.is_none();
        let inputs = fields + if creating { state.form.participants.len() } else { 0 };

        match key.code {
            KeyCode::Enter => return self.submit_project(&state.form),
            KeyCode::Tab | KeyCode::Down => state.focus_next(inputs),
            KeyCode::BackTab | KeyCode::Up => state.focus_prev(inputs),
            KeyCode::Char('n') if creating && key.modifiers.contains(KeyModifiers::CONTROL) => {
                let row = state.form.participants.add_row();
                state.focus = fields + row;
            }
            _ if state.edit(key) => {}
            _ => {
                let row = state.extra_focus()?;
                let participants = &mut state.form.participants;
                match key.code {
                    KeyCode::Char('h' | 'l') | KeyCode::Left | KeyCode::Right => {
                        participants.cycle_user(row, &self.users);
                    }
                    KeyCode::Char('r' | ' ') => participants.cycle_role(row),
                    KeyCode::Char('x') | KeyCode::Delete => {
                        participants.remove_row(row);
                        let inputs = fields + participants.len();
                        state.focus = state.focus.min(inputs.saturating_sub(1));
                    }
                    _ => {}
                }
            }
        }
        None
    }

    fn submit_project(&mut self, form: &ProjectForm) -> Option<NetCommand> {
        let user_id = self.user_id()?;
        let submitted = if form.editing.is_some() {
            form.submit_update(user_id)
                .map(|update| update.map(NetCommand::UpdateProject))
        } else {
            form.submit_new().map(|(project, participants)| {
                Some(NetCommand::CreateProject {
                    project,
                    participants,
                })
            })
        };
        submitted.unwrap_or_else(|e| {
            self.notify(e.to_string());
            None
        })
    }

    fn task_form_key(&mut self, state: &mut FormState<TaskForm>, key: KeyEvent) -> Option<NetCommand> {
        let inputs = state.form.labels().len() + 1;
        match key.code {
            KeyCode::Enter => return self.submit_task(&state.form),
            KeyCode::Tab | KeyCode::Down => state.focus_next(inputs),
            KeyCode::BackTab | KeyCode::Up => state.focus_prev(inputs),
            _ if state.edit(key) => {}
            KeyCode::Char('h' | 'l' | ' ') | KeyCode::Left | KeyCode::Right => {
                if state.extra_focus().is_some() {
                    state.form.priority = state.form.priority.cycle();
                }
            }
            _ => {}
        }
        None
    }

    fn submit_task(&mut self, form: &TaskForm) -> Option<NetCommand> {
        let project_id = self.project.as_ref()?.id;
        let user_id = self.user_id()?;
        let submitted = if form.editing.is_some() {
            form.submit_update(project_id, user_id)
                .map(|task| task.map(NetCommand::EditTask))
        } else {
            form.submit_new(project_id)
                .map(|task| Some(NetCommand::CreateTask(task)))
        };
        submitted.unwrap_or_else(|e| {
            self.notify(e.to_string());
            None
        })
    }

    fn participants_key(
        &mut self,
        panel: &mut ParticipantsPanel,
        key: KeyEvent,
    ) -> Option<NetCommand> {
        let member_count = panel.members.as_ref().map_or(0, |m| m.users.len());
        match (panel.adding_focus, key.code) {
            (_, KeyCode::Char('a')) => {
                panel.adding_focus = Some(panel.adding.add_row());
            }
            (_, KeyCode::Tab) => {
                panel.adding_focus = match panel.adding_focus {
                    None if !panel.adding.is_empty() => Some(0),
                    _ => None,
                };
            }
            (_, KeyCode::Enter) => {
                if panel.adding.is_empty() {
                    return None;
                }
                match panel.adding.submit() {
                    Ok(users) => {
                        return Some(NetCommand::AddParticipants(UsersProject {
                            project_id: panel.project_id,
                            users,
                        }));
                    }
                    Err(e) => self.notify(e.to_string()),
                }
            }
            (Some(row), KeyCode::Char('j') | KeyCode::Down) => {
                panel.adding_focus = Some(step(row, panel.adding.len(), 1));
            }
            (Some(row), KeyCode::Char('k') | KeyCode::Up) => {
                panel.adding_focus = Some(step(row, panel.adding.len(), -1));
            }
            (Some(row), KeyCode::Char('h' | 'l') | KeyCode::Left | KeyCode::Right) => {
                let candidates = self.candidates(panel.members.as_ref());
                panel.adding.cycle_user(row, &candidates);
            }
            (Some(row), KeyCode::Char('r')) => panel.adding.cycle_role(row),
            (Some(row), KeyCode::Char('x') | KeyCode::Delete) => {
                panel.adding.remove_row(row);
                panel.adding_focus = (!panel.adding.is_empty())
                    .then(|| row.min(panel.adding.len() - 1));
            }
            (None, KeyCode::Char('j') | KeyCode::Down) => {
                panel.selected = step(panel.selected, member_count, 1);
            }
            (None, KeyCode::Char('k') | KeyCode::Up) => {
                panel.selected = step(panel.selected, member_count, -1);
            }
            (None, KeyCode::Char('x') | KeyCode::Delete) => {
                let line = panel.members.as_ref()?.users.get(panel.selected)?;
                return Some(NetCommand::RemoveParticipant {
                    project_id: panel.project_id,
                    membership_id: line.id?,
                });
            }
            _ => {}
        }
        None
    }

    /// Users that are not yet members.
    fn candidates(&self, members: Option<&UsersProject>) -> Vec<User> {
        self.users
            .iter()
            .filter(|u| members.is_none_or(|m| m.users.iter().all(|line| line.user_id != u.id)))
            .cloned()
            .collect()
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    fn open_project(&mut self, project: Project) -> NetCommand {
        let project_id = project.id;
        self.board = Board::from_tasks(project.tasks.iter().cloned());
        self.project = Some(project);
        self.cursor = BoardCursor::default();
        self.grab = None;
        self.screen = Screen::Board;
        NetCommand::LoadProject(project_id)
    }

    fn close_project(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(pending = self.pending.len(), "leaving board with transfers in flight");
        }
        self.pending.clear();
        self.project = None;
        self.board = Board::new();
        self.detail = None;
        self.grab = None;
        self.screen = Screen::Dashboard;
    }

    fn logout(&mut self) {
        if let Err(e) = self.session.logout() {
            tracing::warn!(error = %e, "could not clear stored session");
            self.notify(format!("Could not clear the stored session: {e}"));
        }
        self.close_project();
        self.projects.clear();
        self.selected_project = 0;
        self.users.clear();
        self.login = FormState::default();
        self.screen = Screen::Login;
    }

    // -----------------------------------------------------------------------
    // Network events
    // -----------------------------------------------------------------------

    /// Apply an event from the network coordinator. Returns a follow-up
    /// command when the event calls for one.
    #[allow(clippy::too_many_lines)]
    pub fn apply_net_event(&mut self, event: NetEvent) -> Option<NetCommand> {
        match event {
            NetEvent::LoggedIn(user) => {
                let user_id = user.id;
                if let Err(e) = self.session.login(user) {
                    tracing::warn!(error = %e, "could not persist session");
                    self.notify(format!("Logged in, but the session could not be saved: {e}"));
                }
                self.login = FormState::default();
                self.screen = Screen::Dashboard;
                return Some(NetCommand::LoadProjects(user_id));
            }
            NetEvent::LoginRejected => self.notify("Invalid email or password"),
            NetEvent::SignedUp(user) => {
                self.signup = FormState::default();
                self.login = FormState::new(LoginForm {
                    email: user.email.clone(),
                    password: String::new(),
                });
                self.login.focus = 1;
                self.screen = Screen::Login;
                self.notify(format!("Account created for {}, you can now log in", user.email));
            }
            NetEvent::Users(users) => self.users = users,
            NetEvent::Projects(projects) => {
                self.projects = projects;
                self.selected_project = self
                    .selected_project
                    .min(self.projects.len().saturating_sub(1));
            }
            NetEvent::ProjectLoaded(project) => self.on_project_loaded(project),
            NetEvent::ProjectCreated(project) => {
                tracing::info!(project = %project.id, "project created");
                self.close_modal(|m| matches!(m, Modal::Project(_)));
                return self.user_id().map(NetCommand::LoadProjects);
            }
            NetEvent::ProjectUpdated(project) => {
                self.close_modal(|m| matches!(m, Modal::Project(_)));
                if let Some(listed) = self.projects.iter_mut().find(|p| p.id == project.id) {
                    listed.clone_from(&project);
                }
                if let Some(open) = self.project.as_mut().filter(|p| p.id == project.id) {
                    *open = project;
                }
            }
            NetEvent::ProjectDeleted(project_id) => {
                self.projects.retain(|p| p.id != project_id);
                self.selected_project = self
                    .selected_project
                    .min(self.projects.len().saturating_sub(1));
                if self.project.as_ref().is_some_and(|p| p.id == project_id) {
                    self.close_project();
                }
            }
            NetEvent::TaskCreated(task) => {
                self.close_modal(|m| matches!(m, Modal::Task(_)));
                if self.project.is_some() {
                    self.board.insert(task);
                }
            }
            NetEvent::TaskUpdated { ticket, task } => self.settle_transfer(ticket, Ok(task)),
            NetEvent::TaskUpdateFailed { ticket, error } => {
                self.settle_transfer(ticket, Err(error));
            }
            NetEvent::TaskEdited(task) => {
                self.close_modal(|m| matches!(m, Modal::Task(_)));
                if let Some(data) = self
                    .detail
                    .as_mut()
                    .and_then(|d| d.data.as_mut())
                    .filter(|d| d.task.id == task.id)
                {
                    data.task = task.clone();
                }
                self.board.replace(task);
                self.clamp_cursor();
            }
            NetEvent::TaskDeleted(task_id) => {
                self.board.remove(task_id);
                self.clamp_cursor();
                if self.detail.as_ref().is_some_and(|d| d.task_id == task_id) {
                    self.detail = None;
                    self.screen = Screen::Board;
                }
            }
            NetEvent::Participants {
                participants,
                users,
            } => {
                self.users = users;
                if let Some(Modal::Participants(panel)) = self.modal.as_mut()
                    && panel.project_id == participants.project_id
                {
                    panel.selected = panel
                        .selected
                        .min(participants.users.len().saturating_sub(1));
                    panel.members = Some(participants);
                    panel.adding = ParticipantList::default();
                    panel.adding_focus = None;
                }
            }
            NetEvent::TaskDetail {
                task,
                assignments,
                history,
                members,
            } => {
                if let Some(detail) = self.detail.as_mut().filter(|d| d.task_id == task.id) {
                    detail.selected_member = 0;
                    detail.selected_assignee = 0;
                    detail.data = Some(TaskDetailData {
                        task,
                        assignments,
                        history,
                        members,
                    });
                }
            }
            NetEvent::Assignments {
                task_id,
                assignments,
            } => {
                if let Some(detail) = self.detail.as_mut().filter(|d| d.task_id == task_id)
                    && let Some(data) = detail.data.as_mut()
                {
                    detail.selected_assignee = detail
                        .selected_assignee
                        .min(assignments.len().saturating_sub(1));
                    data.assignments = assignments;
                }
            }
            NetEvent::ProjectHistory {
                project_id,
                entries,
            } => {
                if let Some(Modal::History(panel)) = self.modal.as_mut()
                    && panel.project_id == project_id
                {
                    panel.entries = Some(entries);
                    panel.scroll = 0;
                }
            }
            NetEvent::Notice(message) => self.notify(message),
        }
        None
    }

    /// A command could not be handed to the network coordinator.
    pub fn dispatch_failed(&mut self, command: NetCommand, reason: &str) {
        tracing::warn!(?command, reason, "command not dispatched");
        if let NetCommand::UpdateTask { ticket, .. } = command {
            self.settle_transfer(
                ticket,
                Err(ApiError {
                    message: reason.to_string(),
                    status: None,
                    details: serde_json::Value::Null,
                }),
            );
        }
        self.notify(format!("Request not sent: {reason}"));
    }

    fn settle_transfer(&mut self, ticket: u64, outcome: Result<Task, ApiError>) {
        let Some(pending) = self.pending.remove(&ticket) else {
            tracing::debug!(ticket, "no pending transfer for ticket");
            return;
        };
        match outcome {
            Ok(_) => self.board.confirm(pending),
            Err(error) => {
                tracing::info!(ticket, error = %error, "transfer rejected");
                if let Err(e) = self.board.rollback(pending) {
                    tracing::warn!(ticket, error = %e, "rollback found nothing to restore");
                }
                self.clamp_cursor();
            }
        }
    }

    /// Rebuild the board from fresh project data, then re-apply transfers
    /// still waiting for the server so they can be settled later.
    fn on_project_loaded(&mut self, project: Project) {
        if self.project.as_ref().is_none_or(|p| p.id != project.id) {
            tracing::debug!(project = %project.id, "ignoring data for a project that is not open");
            return;
        }
        let mut board = Board::from_tasks(project.tasks.iter().cloned());
        for pending in self.pending.values() {
            board.reapply(pending);
        }
        self.board = board;
        if let Some(grab) = self.grab
            && self.board.position(grab.task_id).is_none()
        {
            self.grab = None;
        }
        self.project = Some(project);
        self.clamp_cursor();
    }

    fn close_modal(&mut self, which: impl Fn(&Modal) -> bool) {
        if self.modal.as_ref().is_some_and(which) {
            self.modal = None;
        }
    }
}
