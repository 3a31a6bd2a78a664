use super::{authorized, CliError};
use crate::render;
use packnow_core::{OrderWorkflow, PackNowClient};
use packnow_types::{Category, FragilityLevel, Urgency};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Order parameters as given on the command line. Dimensions stay raw text
/// so the draft reports which one is malformed.
#[derive(Debug, Clone)]
pub struct CreateArgs {
	pub category: Option<Category>,
	pub length: String,
	pub width: String,
	pub height: String,
	pub weight: String,
	pub fragility: FragilityLevel,
	pub urgency: Urgency,
	pub address: String,
	pub lat: Option<f64>,
	pub lng: Option<f64>,
	pub yes: bool,
}

/// Answer to the confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Answer {
	Confirm,
	Back,
}

impl Answer {
	pub(crate) fn parse(input: &str) -> Self {
		match input.trim().to_ascii_lowercase().as_str() {
			"y" | "yes" | "confirm" => Answer::Confirm,
			_ => Answer::Back,
		}
	}
}

pub async fn create_order(client: &PackNowClient, args: CreateArgs) -> Result<(), CliError> {
	let mut session = client.sessions().require().await?;

	let mut draft = client
		.new_draft()
		.with_dimensions(args.length, args.width, args.height, args.weight)
		.with_address(args.address);
	draft.category = args.category;
	draft.fragility_level = args.fragility;
	draft.urgency = args.urgency;
	if let Some(lat) = args.lat {
		draft.lat = lat;
	}
	if let Some(lng) = args.lng {
		draft.lng = lng;
	}

	let mut workflow = client.workflow(draft);
	println!("Getting estimate...");
	authorized!(
		client,
		session,
		workflow.request_estimate(&session).await.map(|_| ())
	)?;
	print_estimate(&workflow);

	if !args.yes && prompt().await? == Answer::Back {
		workflow.return_to_drafting()?;
		println!("Back to drafting. No order was placed.");
		return Ok(());
	}

	let id = authorized!(client, session, workflow.confirm_order(&session).await)?;
	println!("Order #{} created.", id);
	println!("Track it with `packnow orders track {}`.", id);
	Ok(())
}

fn print_estimate(workflow: &OrderWorkflow) {
	if let Some(estimate) = workflow.estimate() {
		println!();
		print!("{}", render::estimate(estimate));
	}
}

async fn prompt() -> Result<Answer, CliError> {
	let mut stdout = tokio::io::stdout();
	stdout
		.write_all(b"\nPlace this order? [y]es / [n]o, go back: ")
		.await?;
	stdout.flush().await?;

	let mut line = String::new();
	BufReader::new(tokio::io::stdin())
		.read_line(&mut line)
		.await?;
	Ok(Answer::parse(&line))
}
