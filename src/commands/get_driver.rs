use serenity::{
    all::{CommandInteraction, CommandOptionType, Context, ResolvedValue},
    builder::{CreateCommand, CreateCommandOption, EditInteractionResponse},
};

use super::{deferred_snapshot, edit_text};
use crate::{
    embeds,
    error::Result,
    model::{Driver, Snapshot},
    state::AppState,
};

/// Discord's limit on static option choices.
const MAX_CHOICES: usize = 25;

pub fn register(snapshot: &Snapshot) -> CreateCommand {
    let drivers = snapshot.driver_standings();
    let mut option = CreateCommandOption::new(
        CommandOptionType::String,
        "drivername",
        "Driver to show",
    )
    .required(true);
    if drivers.len() <= MAX_CHOICES {
        for driver in drivers {
            option = option.add_string_choice(&driver.name, &driver.id);
        }
    }

    CreateCommand::new("getdriver")
        .description("Show a driver's profile.")
        .add_option(option)
}

/// Matches a driver id, full name or three-letter code.
pub fn find_driver<'a>(snapshot: &'a Snapshot, query: &str) -> Option<&'a Driver> {
    let query = query.trim();
    snapshot.drivers.get(query).or_else(|| {
        snapshot.drivers.values().find(|driver| {
            driver.name.eq_ignore_ascii_case(query)
                || driver
                    .code
                    .as_deref()
                    .is_some_and(|code| code.eq_ignore_ascii_case(query))
        })
    })
}

pub async fn run(
    ctx: &Context,
    cmd: &CommandInteraction,
    state: &AppState,
) -> Result {
    let snapshot = deferred_snapshot(ctx, cmd, state).await?;
    let query = cmd.data.options().into_iter().find_map(|option| {
        match option.value {
            ResolvedValue::String(text) if option.name == "drivername" => {
                Some(text.to_owned())
            },
            _ => None,
        }
    });

    let Some(driver) = query.and_then(|query| find_driver(&snapshot, &query))
    else {
        return edit_text(ctx, cmd, "Could not find that driver.").await;
    };

    cmd.edit_response(
        ctx,
        EditInteractionResponse::new().embed(embeds::driver_profile(driver)),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::find_driver;
    use crate::{
        middleware::parser::{parse_driver_standings, tests::DRIVER_STANDINGS},
        model::Snapshot,
    };

    fn snapshot() -> Snapshot {
        Snapshot {
            drivers: parse_driver_standings(DRIVER_STANDINGS.as_bytes()).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn finds_by_id_name_or_code() {
        let snapshot = snapshot();
        for query in ["max_verstappen", "max verstappen", "VER", " ver "] {
            assert_eq!(
                find_driver(&snapshot, query).map(|d| d.id.as_str()),
                Some("max_verstappen"),
                "{query:?}"
            );
        }
        assert!(find_driver(&snapshot, "nobody").is_none());
    }
}
