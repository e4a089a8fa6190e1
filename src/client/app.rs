//! The client's view state machine and the data shown on the dashboard.

use time::OffsetDateTime;

use crate::{
    Category, CategoryForm, CategoryId, Identity, LogInForm, RegisterForm, Transaction,
    TransactionDetail, TransactionId, TransactionListItem,
    client::{
        ApiClient, ClientError, NewTransactionRequest, Session, SessionStore, Summary, summarize,
    },
};

/// The screens of the client.
///
/// [View::LogIn] and [View::Register] are shown without a session, and
/// [View::Dashboard] needs one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// The log in form.
    LogIn,
    /// The registration form.
    Register,
    /// The summary, categories and transactions of the logged in user.
    Dashboard,
}

/// The lists shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    /// The user's categories, newest first.
    pub categories: Vec<Category>,
    /// The user's transactions, newest first.
    pub transactions: Vec<TransactionListItem>,
}

impl Dashboard {
    /// Fetch the categories and transactions at the same time.
    pub async fn fetch(api: &ApiClient, token: &str) -> Result<Self, ClientError> {
        let (categories, transactions) =
            tokio::try_join!(api.categories(token), api.transactions(token))?;

        Ok(Self {
            categories,
            transactions,
        })
    }

    /// The totals and chart for the current transactions.
    pub fn summary(&self) -> Summary {
        summarize(&self.transactions)
    }
}

/// Ties the API client, the cached session and the current view together.
///
/// Any unauthorized response evicts the session and returns to [View::LogIn].
/// The dashboard is refetched in full after every change.
#[derive(Debug)]
pub struct ClientApp {
    api: ApiClient,
    sessions: SessionStore,
    view: View,
    dashboard: Dashboard,
}

impl ClientApp {
    /// Start on the dashboard if `sessions` has a current session, otherwise
    /// on the log in view.
    pub fn new(api: ApiClient, mut sessions: SessionStore, now: OffsetDateTime) -> Self {
        let view = match sessions.current(now) {
            Some(_) => View::Dashboard,
            None => View::LogIn,
        };

        Self {
            api,
            sessions,
            view,
            dashboard: Dashboard::default(),
        }
    }

    /// The view that should be shown.
    pub fn view(&self) -> View {
        self.view
    }

    /// The API client used for requests.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The lists from the last refresh.
    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Switch between the log in and registration views.
    ///
    /// Has no effect while logged in.
    pub fn show(&mut self, view: View) {
        if self.view != View::Dashboard && view != View::Dashboard {
            self.view = view;
        }
    }

    /// The identity of the logged in user, if the session is current.
    pub fn identity(&mut self, now: OffsetDateTime) -> Option<&Identity> {
        self.sessions.current(now).map(|session| &session.identity)
    }

    /// Register a user, cache their session and go to the dashboard.
    pub async fn register(
        &mut self,
        form: &RegisterForm,
        now: OffsetDateTime,
    ) -> Result<Identity, ClientError> {
        let result = self.api.register(form).await;
        let response = self.check(result)?;

        self.start_session(Session::new(response, now))
    }

    /// Log in a user, cache their session and go to the dashboard.
    pub async fn log_in(
        &mut self,
        form: &LogInForm,
        now: OffsetDateTime,
    ) -> Result<Identity, ClientError> {
        let result = self.api.log_in(form).await;
        let response = self.check(result)?;

        self.start_session(Session::new(response, now))
    }

    fn start_session(&mut self, session: Session) -> Result<Identity, ClientError> {
        let identity = session.identity.clone();
        tracing::info!("Logged in as {}", identity.email);

        self.sessions.save(session)?;
        self.view = View::Dashboard;

        Ok(identity)
    }

    /// Forget the session and go back to the log in view.
    pub fn log_out(&mut self) -> Result<(), ClientError> {
        self.view = View::LogIn;
        self.dashboard = Dashboard::default();
        self.sessions.evict()
    }

    /// Fetch the dashboard lists again.
    pub async fn refresh(&mut self, now: OffsetDateTime) -> Result<&Dashboard, ClientError> {
        let token = self.token(now)?;
        let result = Dashboard::fetch(&self.api, &token).await;
        self.dashboard = self.check(result)?;

        Ok(&self.dashboard)
    }

    /// Create a category and refresh the dashboard.
    pub async fn create_category(
        &mut self,
        form: &CategoryForm,
        now: OffsetDateTime,
    ) -> Result<Category, ClientError> {
        let token = self.token(now)?;
        let result = self.api.create_category(&token, form).await;
        let category = self.check(result)?;
        self.refresh(now).await?;

        Ok(category)
    }

    /// Delete a category and refresh the dashboard.
    pub async fn delete_category(
        &mut self,
        category_id: CategoryId,
        now: OffsetDateTime,
    ) -> Result<String, ClientError> {
        let token = self.token(now)?;
        let result = self.api.delete_category(&token, category_id).await;
        let message = self.check(result)?;
        self.refresh(now).await?;

        Ok(message)
    }

    /// Create a transaction and refresh the dashboard.
    pub async fn create_transaction(
        &mut self,
        request: NewTransactionRequest,
        now: OffsetDateTime,
    ) -> Result<Transaction, ClientError> {
        let token = self.token(now)?;
        let result = self.api.create_transaction(&token, request).await;
        let transaction = self.check(result)?;
        self.refresh(now).await?;

        Ok(transaction)
    }

    /// Fetch a single transaction with its category.
    pub async fn transaction(
        &mut self,
        transaction_id: TransactionId,
        now: OffsetDateTime,
    ) -> Result<TransactionDetail, ClientError> {
        let token = self.token(now)?;
        let result = self.api.transaction(&token, transaction_id).await;

        self.check(result)
    }

    /// Delete a transaction and refresh the dashboard.
    pub async fn delete_transaction(
        &mut self,
        transaction_id: TransactionId,
        now: OffsetDateTime,
    ) -> Result<String, ClientError> {
        let token = self.token(now)?;
        let result = self.api.delete_transaction(&token, transaction_id).await;
        let message = self.check(result)?;
        self.refresh(now).await?;

        Ok(message)
    }

    fn token(&mut self, now: OffsetDateTime) -> Result<String, ClientError> {
        let token = self
            .sessions
            .current(now)
            .map(|session| session.token.clone());

        match token {
            Some(token) => Ok(token),
            None => {
                self.view = View::LogIn;
                Err(ClientError::NoSession)
            }
        }
    }

    /// Evict the session if `result` shows that it is no longer accepted.
    fn check<T>(&mut self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(error) = &result
            && error.is_unauthorized()
        {
            tracing::info!("Session rejected by the server: {error}");
            self.view = View::LogIn;
            self.dashboard = Dashboard::default();

            if let Err(evict_error) = self.sessions.evict() {
                tracing::warn!("Could not remove the rejected session: {evict_error}");
            }
        }

        result
    }
}
