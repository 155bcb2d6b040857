use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use auth::JwtConfig;
use auth::JwtHandler;
use music_service::domain::auth::service::AuthService;
use music_service::domain::user::errors::UserError;
use music_service::domain::user::models::ListUsersQuery;
use music_service::domain::user::models::Role;
use music_service::domain::user::models::User;
use music_service::domain::user::models::UserId;
use music_service::domain::user::models::Username;
use music_service::domain::user::ports::UserRepository;
use music_service::domain::user::service::UserService;
use music_service::inbound::http::router::cors_layer;
use music_service::inbound::http::router::create_router;
use music_service::inbound::http::router::AppState;
use music_service::outbound::cache::InMemoryTokenCache;
use serde_json::json;
use serde_json::Value;
use tokio::sync::RwLock;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const PASSWORD: &str = "Str0ng!Pass";

/// Credential store kept in memory so HTTP tests need no database.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    fn conflict(users: &HashMap<UserId, User>, user: &User) -> Option<UserError> {
        users.values().filter(|other| other.id != user.id).find_map(|other| {
            if other.username == user.username {
                Some(UserError::UsernameAlreadyExists(
                    user.username.as_str().to_string(),
                ))
            } else if other.email == user.email {
                Some(UserError::EmailAlreadyExists(user.email.as_str().to_string()))
            } else {
                None
            }
        })
    }

    /// Change a stored user's role, bypassing the API.
    pub async fn set_role(&self, username: &str, role: Role) {
        let mut users = self.users.write().await;
        let user = users
            .values_mut()
            .find(|user| user.username.as_str() == username)
            .expect("User not found");
        user.role = role;
    }

    pub async fn remove(&self, username: &str) {
        self.users
            .write()
            .await
            .retain(|_, user| user.username.as_str() != username);
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.write().await;
        if let Some(err) = Self::conflict(&users, &user) {
            return Err(err);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| &user.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email.as_str() == email)
            .cloned())
    }

    async fn list(&self, query: ListUsersQuery) -> Result<Vec<User>, UserError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users
            .into_iter()
            .skip(query.skip as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(UserError::NotFound(user.id.to_string()));
        }
        if let Some(err) = Self::conflict(&users, &user) {
            return Err(err);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }
}

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub users: Arc<InMemoryUserRepository>,
    pub cache: Arc<InMemoryTokenCache>,
    pub jwt_handler: JwtHandler,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let users = Arc::new(InMemoryUserRepository::default());
        let cache = Arc::new(InMemoryTokenCache::new());
        let authenticator = Arc::new(Authenticator::new(JwtConfig::new(JWT_SECRET)));

        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&users),
            Arc::clone(&cache),
            authenticator,
        ));
        let user_service = Arc::new(UserService::new(Arc::clone(&users)));

        let state = AppState::new(auth_service, user_service).with_internal_errors_exposed(true);
        let router = create_router(state, cors_layer(&["*".to_string()]));

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::builder()
                .cookie_store(true)
                .build()
                .expect("Failed to create reqwest client"),
            users,
            cache,
            jwt_handler: JwtHandler::new(JwtConfig::new(JWT_SECRET)),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(&format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make PATCH request with Bearer token
    pub fn patch_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .patch(&format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Register an account and return the response body.
    pub async fn register(&self, username: &str, email: &str) -> Value {
        let response = self
            .post("/api/auth/register")
            .json(&json!({
                "username": username,
                "email": email,
                "password": PASSWORD
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.expect("Failed to parse response")
    }

    /// Log in with JSON credentials and return the token pair body.
    pub async fn login(&self, username_or_email: &str) -> Value {
        let response = self
            .post("/api/auth/login")
            .json(&json!({
                "username_or_email": username_or_email,
                "password": PASSWORD
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("Failed to parse response")
    }

    pub async fn refresh(&self, refresh_token: &str) -> reqwest::Response {
        self.post("/api/auth/refresh")
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Register, promote to admin and log in, returning the access token.
    pub async fn admin_access_token(&self) -> String {
        self.register("admin", "admin@example.com").await;
        self.users.set_role("admin", Role::Admin).await;
        self.login("admin").await["access_token"]
            .as_str()
            .expect("Missing access token")
            .to_string()
    }
}
