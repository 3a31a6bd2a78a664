use super::CliError;
use crate::render;
use packnow_core::{PackNowClient, Registration, SessionError};
use packnow_types::{password_strength, GeoPoint, SecretString};

/// Registration form fields taken from the command line.
#[derive(Debug, Clone)]
pub struct RegisterArgs {
	pub name: String,
	pub phone: String,
	pub email: Option<String>,
	pub password: String,
	pub lat: Option<f64>,
	pub lng: Option<f64>,
}

pub async fn register(client: &PackNowClient, args: RegisterArgs) -> Result<(), CliError> {
	let location = match (args.lat, args.lng) {
		(Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
		_ => None,
	};
	let registration = Registration {
		name: args.name,
		phone: args.phone,
		email: args.email.unwrap_or_default(),
		password: SecretString::from(args.password),
		location,
	};

	let session = match client.sessions().register(&registration).await {
		Ok(session) => session,
		Err(SessionError::Validation(e)) if e.field() == "password" => {
			let report = registration.password.with_exposed(password_strength);
			eprint!("{}", render::password_report(&report));
			return Err(SessionError::Validation(e).into());
		}
		Err(e) => return Err(e.into()),
	};
	println!("Welcome to PackNow! Logged in as {}.", session.phone);
	Ok(())
}

pub async fn login(client: &PackNowClient, phone: &str, password: String) -> Result<(), CliError> {
	let session = client
		.sessions()
		.login(phone, SecretString::from(password))
		.await?;
	println!("Logged in as {}.", session.phone);
	Ok(())
}

pub async fn logout(client: &PackNowClient) -> Result<(), CliError> {
	client.sessions().logout().await?;
	println!("Logged out.");
	Ok(())
}

pub async fn whoami(client: &PackNowClient) -> Result<(), CliError> {
	let mut session = client.sessions().require().await?;
	let user = super::authorized!(client, session, client.sessions().current_user(&session).await)?;

	println!("{}", user.name);
	println!("Phone  {}", user.phone);
	if let Some(email) = user.email.filter(|e| !e.is_empty()) {
		println!("Email  {}", email);
	}
	Ok(())
}
