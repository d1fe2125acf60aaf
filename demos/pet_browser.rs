//! Pet browser example demonstrating queries, URL-backed filters and mutations.
//!
//! This example shows:
//! - A listing query driven by the view state in the page URL
//! - Filter and sort changes becoming a single history replacement
//! - Router navigations feeding back into the view state
//! - Submitting an interest and the tag invalidation that follows
//!
//! A scripted transport stands in for the backend so the example runs offline.
//!
//! Run with: `cargo run --example pet_browser`

use std::sync::Arc;

use color_eyre::eyre::{Result, eyre};
use futures::StreamExt;
use futures::stream::{BoxStream, select};
use pawhub_sync::list_state::{ChannelNavigator, Navigation};
use pawhub_sync::prelude::*;
use pawhub_sync::transport::{Method, MockTransport};
use serde_json::json;
use tokio::time::Duration;

/// Messages that the application can receive
#[derive(Debug)]
enum Message {
    /// Listing query result
    Listing(QueryResult<Paginated<Pet>>),
    /// Pending interests query result
    Pending(QueryResult<Paginated<Interest>>),
    /// The router replaced the URL
    Navigated(Navigation),
    /// Interest submission result
    Submitted(MutationResult<SubmittedInterest>),
}

/// Scripted user actions, applied one per settled listing.
#[derive(Debug)]
enum Step {
    FilterPoodles,
    SortByPrice,
    Submit,
    ClearFilters,
}

/// Application state
struct App {
    api: ApiClient,
    list: ListStateSync<PetSort, ChannelNavigator>,
    steps: Vec<Step>,
    status: String,
}

impl App {
    fn listing(&self) -> Subscription<Message> {
        let endpoint = pets::list_view(self.list.state(), self.list.schema());
        Subscription::new(self.api.source(endpoint)).map(Message::Listing)
    }

    fn pending(&self) -> Subscription<Message> {
        Subscription::new(self.api.source(interests::pending(Some(5)))).map(Message::Pending)
    }

    fn update(&mut self, msg: Message) -> Result<Command<Message>> {
        match msg {
            Message::Listing(result) => {
                if result.is_fetching {
                    println!("  loading {} ...", self.list.location());
                    return Ok(Command::none());
                }
                match &result.state {
                    QueryState::Success { data, .. } => {
                        println!(
                            "  {} -> {} of {} pets",
                            self.list.location(),
                            data.data.len(),
                            data.meta.total
                        );
                        for pet in &data.data {
                            println!("    {} ({}) {}", pet.name, pet.breed, pet.formatted_price);
                        }
                    }
                    QueryState::Error(e) => println!("  listing failed: {e}"),
                    QueryState::Loading => return Ok(Command::none()),
                }
                self.next_step()
            }
            Message::Pending(result) => {
                if let Some(page) = result.data() {
                    println!("  {} pending interests", page.meta.total);
                }
                Ok(Command::none())
            }
            Message::Navigated(navigation) => {
                println!("router: replace {} (scroll: {})", navigation.location, navigation.scroll);
                self.list.on_navigation(navigation.location);
                Ok(Command::none())
            }
            Message::Submitted(result) => {
                self.status = match (result.data(), result.error()) {
                    (Some(submitted), _) => format!("interest {} submitted", submitted.id),
                    (_, Some(e)) => format!("submission failed: {e}"),
                    _ => String::new(),
                };
                println!("{}", self.status);
                self.next_step()
            }
        }
    }

    fn next_step(&mut self) -> Result<Command<Message>> {
        if self.steps.is_empty() {
            return Ok(Command::none());
        }
        let step = self.steps.remove(0);
        println!("\n> {step:?}");
        match step {
            Step::FilterPoodles => {
                self.list
                    .update(ViewStateUpdate::new().filter("breed", "Poodle"))?;
            }
            Step::SortByPrice => {
                self.list
                    .update(ViewStateUpdate::new().sort(PetSort::PriceLow).page_size(24))?;
            }
            Step::Submit => {
                let form = InterestFormData {
                    pet_id: "42".to_string(),
                    buyer_name: "Amina".to_string(),
                    buyer_email: "amina@example.com".to_string(),
                    message: "Is Coco still available?".to_string(),
                    ..InterestFormData::default()
                };
                return Ok(self
                    .api
                    .mutation_command(interests::submit(&form)?, |r| Message::Submitted(r.into())));
            }
            Step::ClearFilters => {
                self.list.clear();
            }
        }
        Ok(Command::none())
    }
}

fn backend() -> MockTransport {
    let mock = MockTransport::new().with_latency(Duration::from_millis(150));
    mock.respond_page(
        Method::Get,
        "/pets",
        json!([
            { "id": "42", "name": "Coco", "breed": "Poodle", "formatted_price": "KES 45,000" },
            { "id": "7", "name": "Bella", "breed": "Beagle", "formatted_price": "KES 30,000" },
        ]),
        2,
    );
    mock.respond_page(Method::Get, "/interests", json!([{ "id": "1", "pet_id": "7" }]), 1);
    mock.respond_page(
        Method::Get,
        "/interests",
        json!([{ "id": "1", "pet_id": "7" }, { "id": "2", "pet_id": "42" }]),
        2,
    );
    mock.respond_ok(
        Method::Post,
        "/interests/submit",
        json!({ "id": "2", "message": "Interest submitted" }),
    );
    mock
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    pawhub_sync::logging::init();

    let mock = backend();
    let api = ApiClient::with_transport(ApiConfig::default(), Arc::new(mock.clone()));
    let (navigator, navigations) = ChannelNavigator::new();
    let mut app = App {
        list: ListStateSync::pets(navigator, Location::parse("/pets?ref=newsletter")),
        api,
        steps: vec![
            Step::FilterPoodles,
            Step::SortByPrice,
            Step::Submit,
            Step::ClearFilters,
        ],
        status: String::new(),
    };

    let mut navigations = navigations.map(Message::Navigated);
    let mut pending = app.pending().into_stream();
    let mut listing = app.listing().into_stream();
    let mut commands: BoxStream<'static, Message> = futures::stream::empty().boxed();
    let mut location = app.list.location().clone();

    loop {
        let msg = tokio::select! {
            Some(msg) = listing.next() => msg,
            Some(msg) = pending.next() => msg,
            Some(msg) = navigations.next() => msg,
            Some(msg) = commands.next() => msg,
            () = tokio::time::sleep(Duration::from_secs(2)) => break,
        };

        if let Some(stream) = app.update(msg)?.into_stream() {
            commands = select(commands, stream).boxed();
        }

        // A new URL means a new listing query; the old subscription is dropped
        if *app.list.location() != location {
            location = app.list.location().clone();
            listing = app.listing().into_stream();
        }
    }

    if !app.steps.is_empty() {
        return Err(eyre!("demo stopped with {} steps left", app.steps.len()));
    }
    println!(
        "\n{} requests sent, {} cached queries",
        mock.call_count(),
        app.api.cache().len()
    );
    Ok(())
}
