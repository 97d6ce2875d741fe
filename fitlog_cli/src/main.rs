use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use fitlog_core::targets::CustomTargetEditor;
use fitlog_core::wellness::{
    goal_status, latest_per_week, number_sets, recommended_water_ml, summarize_change,
    DEFAULT_STEP_GOAL,
};
use fitlog_core::*;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "fitlog")]
#[command(about = "Nutrition, hydration, sleep and workout tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// User id to read and write logs for
    #[arg(long, global = true)]
    user: Option<String>,

    /// Day to operate on (YYYY-MM-DD, default today)
    #[arg(long, global = true)]
    date: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the food catalog
    #[command(subcommand)]
    Food(FoodCommand),

    /// Log and review meals
    #[command(subcommand)]
    Meal(MealCommand),

    /// Daily calorie and macro targets
    #[command(subcommand)]
    Target(TargetCommand),

    /// Water intake
    #[command(subcommand)]
    Water(WaterCommand),

    /// Sleep logs
    #[command(subcommand)]
    Sleep(SleepCommand),

    /// Daily step counts
    #[command(subcommand)]
    Steps(StepsCommand),

    /// Workout logs
    #[command(subcommand)]
    Workout(WorkoutCommand),

    /// Weekly body-measurement check-ins
    #[command(subcommand)]
    Checkin(CheckinCommand),

    /// Combined per-day progress view
    Progress {
        /// Number of days to include (default from config)
        #[arg(long)]
        days: Option<u32>,

        /// Also export the view as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum FoodCommand {
    /// Search foods by name
    Search {
        /// Part of the food name (empty lists everything)
        #[arg(default_value = "")]
        query: String,

        /// Only foods in this category
        #[arg(long)]
        category: Option<String>,
    },
    /// List food categories
    Categories,
}

#[derive(Subcommand)]
enum MealCommand {
    /// Add a food to a meal
    Add {
        /// Food name as listed in the catalog
        food: String,
        /// Quantity in the food's serving unit
        quantity: String,
        /// Breakfast, Lunch or Dinner
        #[arg(long)]
        slot: String,
    },
    /// Change the quantity of a logged item
    Edit {
        slot: String,
        /// Item number as shown by `meal show`
        item: usize,
        quantity: String,
    },
    /// Remove a logged item
    Delete {
        slot: String,
        /// Item number as shown by `meal show`
        item: usize,
    },
    /// Show the day's meals, totals and remaining budget
    Show,
}

#[derive(Subcommand)]
enum TargetCommand {
    /// Show the active target
    Show,
    /// Compute targets from biometrics
    Compute(BiometricArgs),
    /// Set a custom target
    Custom {
        /// Calories; macros are split 30/45/25
        #[arg(long)]
        calories: Option<i64>,
        /// Protein grams; calories are recomputed
        #[arg(long)]
        protein: Option<i64>,
        /// Carb grams; calories are recomputed
        #[arg(long)]
        carbs: Option<i64>,
        /// Fat grams; calories are recomputed
        #[arg(long)]
        fats: Option<i64>,
    },
    /// Drop the custom target and go back to computed targets
    Clear,
    /// Forget biometrics and both targets
    Reset,
}

#[derive(Args)]
struct BiometricArgs {
    #[arg(long)]
    age: f64,
    /// male, female or other
    #[arg(long)]
    gender: String,
    #[arg(long)]
    height: f64,
    #[arg(long)]
    weight: f64,
    /// sedentary, light, moderate or active
    #[arg(long, default_value = "sedentary")]
    activity: String,
    /// cut, maintain or bulk
    #[arg(long, default_value = "maintain")]
    goal: String,
}

#[derive(Subcommand)]
enum WaterCommand {
    /// Add a drink to the day's total
    Add {
        /// Amount in ml
        amount: f64,
        /// Mark the day as a creatine day
        #[arg(long)]
        creatine: bool,
    },
    /// Show intake against the goal
    Show {
        /// Body weight in kg, to derive the goal
        #[arg(long)]
        weight: Option<f64>,
    },
}

#[derive(Subcommand)]
enum SleepCommand {
    /// Log last night's sleep (replaces an existing log for the day)
    Log {
        /// Time you fell asleep (HH:MM)
        #[arg(long)]
        sleep: String,
        /// Time you woke up (HH:MM)
        #[arg(long)]
        wake: String,
        /// Quality from 1 to 5
        #[arg(long)]
        quality: u8,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
enum StepsCommand {
    /// Record the day's step count (replaces an existing count for the day)
    Log {
        steps: u32,
        /// Daily goal (default: the day's existing goal, else 10000)
        #[arg(long)]
        goal: Option<u32>,
    },
    /// Show the day's steps and the step history
    Show,
}

#[derive(Subcommand)]
enum WorkoutCommand {
    /// Log an exercise
    Log {
        /// Workout name, e.g. Push
        #[arg(long)]
        workout: String,
        #[arg(long)]
        exercise: String,
        /// One set as REPSxKG, repeatable
        #[arg(long = "set")]
        sets: Vec<String>,
        /// Intensity from 1 to 5
        #[arg(long)]
        intensity: Option<u8>,
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        level: Option<String>,
        #[arg(long)]
        tag: Option<String>,
    },
}

#[derive(Subcommand)]
enum CheckinCommand {
    /// Record a check-in (replaces an existing one for the day)
    Add {
        #[arg(long)]
        weight: f64,
        #[arg(long)]
        chest: f64,
        #[arg(long)]
        waist: f64,
        #[arg(long)]
        arms: f64,
        /// Mood from 1 to 10
        #[arg(long)]
        mood: u8,
        /// Energy from 1 to 10
        #[arg(long)]
        energy: u8,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Latest check-in of each week with the change from the week before
    History,
}

/// Resolved settings for one invocation
struct Context {
    config: Config,
    user: String,
    date: NaiveDate,
}

fn main() -> ExitCode {
    fitlog_core::logging::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_user_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }
    let user = cli.user.unwrap_or_else(|| config.user.id.clone());
    let date = cli.date.unwrap_or_else(|| Local::now().date_naive());
    let ctx = Context { config, user, date };
    tracing::debug!(
        "Running for user {} on {} with data in {:?}",
        ctx.user,
        ctx.date,
        ctx.config.data.data_dir
    );

    let mut store = open_store(&ctx.config);
    let store = store.as_mut();

    match cli.command {
        Commands::Food(cmd) => cmd_food(&ctx, cmd),
        Commands::Meal(cmd) => cmd_meal(&ctx, store, cmd),
        Commands::Target(cmd) => cmd_target(&ctx, store, cmd),
        Commands::Water(cmd) => cmd_water(&ctx, store, cmd),
        Commands::Sleep(cmd) => cmd_sleep(&ctx, store, cmd),
        Commands::Steps(cmd) => cmd_steps(&ctx, store, cmd),
        Commands::Workout(cmd) => cmd_workout(&ctx, store, cmd),
        Commands::Checkin(cmd) => cmd_checkin(&ctx, store, cmd),
        Commands::Progress { days, csv } => cmd_progress(&ctx, store, days, csv),
    }
}

fn load_catalog(config: &Config) -> Result<Catalog> {
    match &config.catalog.path {
        Some(path) => Catalog::load_from(path),
        None => Ok(get_default_catalog().clone()),
    }
}

fn active_target(ctx: &Context, store: &dyn LogStore) -> Result<(MacroTarget, TargetSource)> {
    let profile = store.load_profile(&ctx.user)?;
    Ok(profile.active_target(ctx.config.targets.default_calories))
}

// ============================================================================
// Food and meals
// ============================================================================

fn cmd_food(ctx: &Context, cmd: FoodCommand) -> Result<()> {
    let catalog = load_catalog(&ctx.config)?;
    match cmd {
        FoodCommand::Search { query, category } => {
            let hits = catalog.search(&query, category.as_deref());
            if hits.is_empty() {
                println!("No foods match '{}'.", query);
            }
            for food in hits {
                let n = &food.nutrients;
                println!(
                    "{} [{}] per {}{}: {} kcal, P {}g, C {}g, F {}g, Fib {}g",
                    food.name,
                    food.category,
                    food.serving_size,
                    food.serving_unit,
                    n.calories,
                    n.protein,
                    n.carbs,
                    n.fats,
                    n.fiber
                );
            }
        }
        FoodCommand::Categories => {
            for category in catalog.categories() {
                println!("{}", category);
            }
        }
    }
    Ok(())
}

fn cmd_meal(ctx: &Context, store: &mut dyn LogStore, cmd: MealCommand) -> Result<()> {
    match cmd {
        MealCommand::Add {
            food,
            quantity,
            slot,
        } => {
            let catalog = load_catalog(&ctx.config)?;
            let food = catalog.find(&food)?;
            let quantity = parse_quantity(&quantity)?;
            let slot: MealSlot = slot.parse()?;

            let item = NutritionService::new(store)
                .add_item(&ctx.user, ctx.date, food, quantity, slot)?;
            println!(
                "✓ Added {}{} {} to {} ({} kcal)",
                item.quantity, item.serving_unit, item.name, slot, item.nutrients.calories
            );
        }
        MealCommand::Edit {
            slot,
            item,
            quantity,
        } => {
            let slot: MealSlot = slot.parse()?;
            let quantity = parse_quantity(&quantity)?;
            let index = item_index(item)?;

            let item = NutritionService::new(store)
                .edit_item(&ctx.user, ctx.date, slot, index, quantity)?;
            println!(
                "✓ {} now {}{} ({} kcal)",
                item.name, item.quantity, item.serving_unit, item.nutrients.calories
            );
        }
        MealCommand::Delete { slot, item } => {
            let slot: MealSlot = slot.parse()?;
            let index = item_index(item)?;

            let removed =
                NutritionService::new(store).delete_item(&ctx.user, ctx.date, slot, index)?;
            println!("✓ Removed {} from {}", removed.name, slot);
        }
        MealCommand::Show => show_day(ctx, store)?,
    }
    Ok(())
}

/// Items are numbered from 1 on screen
fn item_index(item: usize) -> Result<usize> {
    item.checked_sub(1)
        .ok_or_else(|| Error::Validation("Item numbers start at 1".into()))
}

fn show_day(ctx: &Context, store: &dyn LogStore) -> Result<()> {
    let log = store.load_daily_log(&ctx.user, ctx.date)?;
    let (target, source) = active_target(ctx, store)?;

    println!("Meals for {} ({})", ctx.date, ctx.user);
    for slot in MealSlot::ALL {
        println!();
        println!("{}:", slot);
        let items = log.items(slot);
        if items.is_empty() {
            println!("  (nothing logged)");
            continue;
        }
        for (i, item) in items.iter().enumerate() {
            println!(
                "  {}. {} {}{}: {} kcal, P {}g, C {}g, F {}g",
                i + 1,
                item.name,
                item.quantity,
                item.serving_unit,
                item.nutrients.calories,
                item.nutrients.protein,
                item.nutrients.carbs,
                item.nutrients.fats
            );
        }
        println!(
            "  Total: {} kcal",
            round1(log.meal_total(slot, Macro::Calories))
        );
    }

    println!();
    println!("Day total vs {} target:", source);
    for nutrient in [Macro::Calories, Macro::Protein, Macro::Carbs, Macro::Fats] {
        let eaten = round1(log.day_total(nutrient));
        let left = round1(log.remaining(nutrient, &target)?);
        let status = if left < 0.0 { "over" } else { "left" };
        println!(
            "  {:<8} {} / {} {} ({} {} {})",
            nutrient,
            eaten,
            target.get(nutrient).unwrap_or_default(),
            nutrient.unit(),
            left.abs(),
            nutrient.unit(),
            status
        );
    }
    println!(
        "  {:<8} {} g",
        Macro::Fiber,
        round1(log.day_total(Macro::Fiber))
    );
    Ok(())
}

// ============================================================================
// Targets
// ============================================================================

fn print_target(target: &MacroTarget, source: TargetSource) {
    println!("Target ({}):", source);
    println!("  Calories: {} kcal", target.calories);
    println!("  Protein:  {} g", target.protein);
    println!("  Carbs:    {} g", target.carbs);
    println!("  Fats:     {} g", target.fats);
}

fn cmd_target(ctx: &Context, store: &mut dyn LogStore, cmd: TargetCommand) -> Result<()> {
    match cmd {
        TargetCommand::Show => {
            let (target, source) = active_target(ctx, store)?;
            print_target(&target, source);
        }
        TargetCommand::Compute(args) => {
            let bio = UserBiometrics {
                age: args.age,
                gender: args.gender.parse()?,
                height_cm: args.height,
                weight_kg: args.weight,
                activity: args.activity.parse()?,
                goal: args.goal.parse()?,
            };
            let mut profile = store.load_profile(&ctx.user)?;
            let target = profile.set_biometrics(bio)?;
            store.save_profile(&ctx.user, &profile)?;

            print_target(&target, TargetSource::Computed);
            if profile.is_custom_mode() {
                println!("Note: a custom target is active; run `fitlog target clear` to use this one.");
            }
        }
        TargetCommand::Custom {
            calories,
            protein,
            carbs,
            fats,
        } => {
            if calories.is_none() && protein.is_none() && carbs.is_none() && fats.is_none() {
                return Err(Error::Validation(
                    "Give --calories and/or --protein, --carbs, --fats".into(),
                ));
            }

            let (current, _) = active_target(ctx, store)?;
            let mut editor = match calories {
                Some(calories) => CustomTargetEditor::from_calories(calories)?,
                None => CustomTargetEditor::new(current),
            };
            if let Some(grams) = protein {
                editor.set_protein(grams)?;
            }
            if let Some(grams) = carbs {
                editor.set_carbs(grams)?;
            }
            if let Some(grams) = fats {
                editor.set_fats(grams)?;
            }
            let target = editor.finish()?;

            store.save_macro_target(&ctx.user, &target, TargetSource::Custom)?;
            print_target(&target, TargetSource::Custom);
        }
        TargetCommand::Clear => {
            let mut profile = store.load_profile(&ctx.user)?;
            if profile.clear_custom() {
                store.save_profile(&ctx.user, &profile)?;
                println!("✓ Custom target cleared");
            } else {
                println!("No custom target set.");
            }
            let (target, source) = profile.active_target(ctx.config.targets.default_calories);
            print_target(&target, source);
        }
        TargetCommand::Reset => {
            let mut profile = store.load_profile(&ctx.user)?;
            if profile.reset() {
                store.save_profile(&ctx.user, &profile)?;
                println!("✓ Biometrics and targets cleared");
            } else {
                println!("No biometrics or targets set.");
            }
            let (target, source) = profile.active_target(ctx.config.targets.default_calories);
            print_target(&target, source);
        }
    }
    Ok(())
}

// ============================================================================
// Hydration, sleep, workouts, check-ins
// ============================================================================

fn today_water(ctx: &Context, store: &dyn LogStore) -> Result<HydrationLog> {
    Ok(store
        .load_hydration_logs(&ctx.user)?
        .into_iter()
        .find(|log| log.date == ctx.date)
        .unwrap_or_else(|| HydrationLog::new(ctx.date)))
}

fn cmd_water(ctx: &Context, store: &mut dyn LogStore, cmd: WaterCommand) -> Result<()> {
    match cmd {
        WaterCommand::Add { amount, creatine } => {
            let mut log = today_water(ctx, store)?;
            let total = log.add_intake(amount)?;
            log.creatine |= creatine;
            store.save_hydration_log(&ctx.user, &log)?;
            println!("✓ {} ml logged for {}", round1(total), ctx.date);
        }
        WaterCommand::Show { weight } => {
            let log = today_water(ctx, store)?;
            let goal = match weight {
                Some(kg) => recommended_water_ml(kg, log.creatine)?,
                None => ctx.config.hydration.daily_goal_ml,
            };
            println!(
                "Water {}: {} / {} ml ({})",
                ctx.date,
                round1(log.amount_ml),
                round1(goal),
                goal_status(log.amount_ml, goal)
            );
            println!("  {} ml left", round1(log.remaining_ml(goal)));
        }
    }
    Ok(())
}

fn parse_clock(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| Error::Validation(format!("Invalid time '{}'. Use HH:MM", value)))
}

fn cmd_sleep(ctx: &Context, store: &mut dyn LogStore, cmd: SleepCommand) -> Result<()> {
    match cmd {
        SleepCommand::Log {
            sleep,
            wake,
            quality,
            notes,
        } => {
            let log = SleepLog::new(
                ctx.date,
                parse_clock(&sleep)?,
                parse_clock(&wake)?,
                quality,
                notes,
            )?;
            store.save_sleep_log(&ctx.user, &log)?;
            println!(
                "✓ Slept {:.2} h on {} (quality {}/5)",
                log.duration_hours, ctx.date, log.quality
            );
        }
    }
    Ok(())
}

fn cmd_steps(ctx: &Context, store: &mut dyn LogStore, cmd: StepsCommand) -> Result<()> {
    let history = store.load_step_logs(&ctx.user)?;
    let today = history.iter().find(|log| log.date == ctx.date);

    match cmd {
        StepsCommand::Log { steps, goal } => {
            let goal = goal
                .or_else(|| today.map(|log| log.goal))
                .unwrap_or(DEFAULT_STEP_GOAL);
            let log = StepLog::new(ctx.date, steps, goal)?;
            store.save_step_log(&ctx.user, &log)?;
            println!(
                "✓ {} steps logged for {} (goal {})",
                log.steps, ctx.date, log.goal
            );
        }
        StepsCommand::Show => {
            match today {
                Some(log) => {
                    println!(
                        "Steps {}: {} / {} ({})",
                        ctx.date,
                        log.steps,
                        log.goal,
                        log.status()
                    );
                    println!("  {} to go", log.remaining());
                }
                None => println!("No steps logged for {}.", ctx.date),
            }

            println!();
            if history.is_empty() {
                println!("No step history yet.");
            } else {
                println!("History:");
                for log in history.iter().rev() {
                    println!("  {}: {} steps", log.date, log.steps);
                }
            }
        }
    }
    Ok(())
}

/// Parse a set written as `REPSxKG`, e.g. `8x62.5`
fn parse_set(value: &str) -> Result<(u32, f64)> {
    let invalid = || Error::Validation(format!("Invalid set '{}'. Use REPSxKG, e.g. 8x60", value));
    let (reps, weight) = value
        .trim()
        .split_once(|c| c == 'x' || c == 'X')
        .ok_or_else(invalid)?;
    let reps: u32 = reps.trim().parse().map_err(|_| invalid())?;
    let weight: f64 = weight.trim().parse().map_err(|_| invalid())?;
    if !weight.is_finite() || weight < 0.0 {
        return Err(invalid());
    }
    Ok((reps, weight))
}

fn cmd_workout(ctx: &Context, store: &mut dyn LogStore, cmd: WorkoutCommand) -> Result<()> {
    match cmd {
        WorkoutCommand::Log {
            workout,
            exercise,
            sets,
            intensity,
            region,
            level,
            tag,
        } => {
            let pairs = sets
                .iter()
                .map(|s| parse_set(s))
                .collect::<Result<Vec<_>>>()?;
            let mut log = ExerciseLog::new(ctx.date, workout, exercise, number_sets(&pairs));
            if let Some(intensity) = intensity {
                log = log.with_intensity(intensity)?;
            }
            log.region = region;
            log.level = level;
            log.tag = tag;

            store.append_exercise_log(&ctx.user, &log)?;
            println!(
                "✓ Logged {} ({} sets, {} kg volume)",
                log.exercise,
                log.sets.len(),
                round1(log.total_volume())
            );
        }
    }
    Ok(())
}

fn cmd_checkin(ctx: &Context, store: &mut dyn LogStore, cmd: CheckinCommand) -> Result<()> {
    match cmd {
        CheckinCommand::Add {
            weight,
            chest,
            waist,
            arms,
            mood,
            energy,
            notes,
        } => {
            let measurements = BodyMeasurements {
                weight_kg: weight,
                chest_cm: chest,
                waist_cm: waist,
                arms_cm: arms,
            };
            let check_in = CheckIn::new(ctx.date, measurements, mood, energy, notes)?;
            store.save_check_in(&ctx.user, &check_in)?;
            println!("✓ Check-in saved for {}", ctx.date);
        }
        CheckinCommand::History => {
            let weekly = latest_per_week(&store.load_check_ins(&ctx.user)?);
            if weekly.is_empty() {
                println!("No check-ins yet.");
            }
            for (i, check_in) in weekly.iter().enumerate() {
                let m = &check_in.measurements;
                println!(
                    "{}: {} kg, chest {} cm, waist {} cm, arms {} cm, mood {}/10, energy {}/10",
                    check_in.date,
                    m.weight_kg,
                    m.chest_cm,
                    m.waist_cm,
                    m.arms_cm,
                    check_in.mood,
                    check_in.energy
                );
                let previous = i.checked_sub(1).map(|p| &weekly[p]);
                let summary = summarize_change(check_in, previous);
                if !summary.is_empty() {
                    println!("  {}", summary);
                }
            }
        }
    }
    Ok(())
}

// ============================================================================
// Progress
// ============================================================================

fn cmd_progress(
    ctx: &Context,
    store: &mut dyn LogStore,
    days: Option<u32>,
    csv: Option<PathBuf>,
) -> Result<()> {
    let days = days.unwrap_or(ctx.config.progress.window_days);
    let combined = within_window(&store.load_combined_log(&ctx.user)?, ctx.date, days);

    if combined.is_empty() {
        println!("No logs in the last {} days.", days);
    }
    for day in &combined {
        let mut parts = Vec::new();
        if let Some(water) = &day.hydration {
            parts.push(format!("water {} ml", round1(water.amount_ml)));
        }
        if let Some(n) = &day.nutrition {
            parts.push(format!(
                "{} kcal (P {} / C {} / F {})",
                round1(n.calories),
                round1(n.protein),
                round1(n.carbs),
                round1(n.fats)
            ));
        }
        if !day.exercises.is_empty() {
            let volume: f64 = day.exercises.iter().map(|e| e.total_volume()).sum();
            parts.push(format!(
                "{} exercises, {} kg volume",
                day.exercises.len(),
                round1(volume)
            ));
        }
        if let Some(sleep) = &day.sleep {
            parts.push(format!(
                "sleep {:.1} h, quality {}/5",
                sleep.duration_hours, sleep.quality
            ));
        }
        println!("{}: {}", day.date, parts.join("; "));
    }

    if let Some(path) = csv {
        let rows = export_combined_csv(&combined, &path)?;
        println!("✓ Exported {} days to {}", rows, path.display());
    }

    Ok(())
}
