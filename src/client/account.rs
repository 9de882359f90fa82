use reqwest::Method;

use crate::{
	model::Profile,
	route::{
		account::model::{
			AuthResponse, ForgotPasswordInput, LoginInput, ResetPasswordInput, SignupInput,
		},
		model::MessageResponse,
	},
};

use super::{ApiClient, ClientError};

/// The signed-in user, if any.
///
/// Signing up or logging in stores the token on the shared [`ApiClient`].
/// [`super::Blogs`] and [`super::Comments`] sharing that client drop their
/// per-user views on their next read.
pub struct Account {
	client: ApiClient,
	user: Option<Profile>,
}

impl Account {
	pub fn new(client: ApiClient) -> Self {
		Self { client, user: None }
	}

	pub fn user(&self) -> Option<&Profile> {
		self.user.as_ref()
	}

	pub async fn is_signed_in(&self) -> bool {
		self.client.token().await.is_some()
	}

	async fn authenticate(
		&mut self,
		result: Result<AuthResponse, ClientError>,
	) -> Result<&Profile, ClientError> {
		let response = result?;

		self.client.set_token(Some(response.token)).await;
		Ok(self.user.insert(response.user))
	}

	pub async fn signup(&mut self, input: &SignupInput) -> Result<&Profile, ClientError> {
		let result = self
			.client
			.json(Method::POST, "/api/user/signup", input)
			.await;

		self.authenticate(result).await
	}

	pub async fn login(&mut self, input: &LoginInput) -> Result<&Profile, ClientError> {
		let result = self
			.client
			.json(Method::POST, "/api/user/login", input)
			.await;

		self.authenticate(result).await
	}

	/// Forgets the token even if the server could not be reached.
	pub async fn logout(&mut self) -> Result<(), ClientError> {
		let request = self.client.request(Method::POST, "/api/user/logout").await;
		let result = self.client.send::<MessageResponse>(request).await;

		self.client.set_token(None).await;
		self.user = None;

		result.map(|_| ())
	}

	/// Fetches the profile of the token's owner.
	pub async fn me(&mut self) -> Result<&Profile, ClientError> {
		match self.client.get::<Profile>("/api/user/me").await {
			Ok(user) => Ok(self.user.insert(user)),
			Err(error) => {
				if error.is_unauthorized() {
					self.user = None;
				}

				Err(error)
			}
		}
	}

	/// Returns the server's confirmation message.
	pub async fn forgot_password(&self, email: &str) -> Result<String, ClientError> {
		let input = ForgotPasswordInput {
			email: email.to_owned(),
		};

		let response: MessageResponse = self
			.client
			.json(Method::POST, "/api/user/forgot-password", &input)
			.await?;

		Ok(response.message)
	}

	pub async fn reset_password(&self, input: &ResetPasswordInput) -> Result<String, ClientError> {
		let response: MessageResponse = self
			.client
			.json(Method::POST, "/api/user/reset-password", input)
			.await?;

		Ok(response.message)
	}
}
