use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use tracing::info;

use crate::config::AppPaths;
use crate::errors::Result;
use crate::load::Load;
use crate::route::{Route, header_links};
use crate::storage::RecipeStore;
use crate::storage::models::{Difficulty, Recipe};
use crate::storage::sqlite::SqliteStore;
use crate::views::create::{IngredientField, RecipeDraft, SubmitOutcome};
use crate::views::detail::{RecipeDetailView, format_amount, paragraphs};
use crate::views::filter::{EMPTY_RESULTS, RecipeListView};
use crate::views::landing::{LandingView, SearchOutcome};
use crate::views::notify::{Alert, Notification};

const TOAST_TTL: Duration = Duration::from_secs(3);
const RANGE_PAGE: i32 = 20;

// ── Screens ────────────────────────────────────────────────────────

struct LandingScreen {
    view: LandingView,
    list_state: ListState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterFocus {
    Title,
    Difficulty,
    CaloriesMin,
    CaloriesMax,
    ProteinMin,
    ProteinMax,
    Results,
}

impl FilterFocus {
    const ORDER: [FilterFocus; 7] = [
        FilterFocus::Title,
        FilterFocus::Difficulty,
        FilterFocus::CaloriesMin,
        FilterFocus::CaloriesMax,
        FilterFocus::ProteinMin,
        FilterFocus::ProteinMax,
        FilterFocus::Results,
    ];

    fn shift(self, delta: isize) -> Self {
        let len = Self::ORDER.len() as isize;
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as isize;
        Self::ORDER[(i + delta).rem_euclid(len) as usize]
    }
}

struct ListScreen {
    view: RecipeListView,
    focus: FilterFocus,
    list_state: ListState,
}

struct DetailScreen {
    view: RecipeDetailView,
    scroll: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Title,
    Description,
    CookingTime,
    Servings,
    Difficulty,
    ImageUrl,
    Ingredient(usize, IngredientField),
    Calories,
    Protein,
    Carbs,
    Fat,
    Instructions,
}

impl FormField {
    fn label(&self) -> String {
        match self {
            FormField::Title => "Recipe Title".to_string(),
            FormField::Description => "Description".to_string(),
            FormField::CookingTime => "Cooking Time (minutes)".to_string(),
            FormField::Servings => "Servings".to_string(),
            FormField::Difficulty => "Difficulty".to_string(),
            FormField::ImageUrl => "Image URL".to_string(),
            FormField::Ingredient(i, IngredientField::Name) => format!("Ingredient {} name", i + 1),
            FormField::Ingredient(_, IngredientField::Amount) => "  amount".to_string(),
            FormField::Ingredient(_, IngredientField::Unit) => "  unit".to_string(),
            FormField::Calories => "Calories".to_string(),
            FormField::Protein => "Protein (g)".to_string(),
            FormField::Carbs => "Carbs (g)".to_string(),
            FormField::Fat => "Fat (g)".to_string(),
            FormField::Instructions => "Instructions".to_string(),
        }
    }
}

struct NewScreen {
    draft: RecipeDraft,
    focus: usize,
    scroll: u16,
}

impl NewScreen {
    fn new() -> Self {
        Self {
            draft: RecipeDraft::default(),
            focus: 0,
            scroll: 0,
        }
    }

    fn fields(&self) -> Vec<FormField> {
        let mut fields = vec![
            FormField::Title,
            FormField::Description,
            FormField::CookingTime,
            FormField::Servings,
            FormField::Difficulty,
            FormField::ImageUrl,
        ];
        for i in 0..self.draft.ingredients().len() {
            fields.push(FormField::Ingredient(i, IngredientField::Name));
            fields.push(FormField::Ingredient(i, IngredientField::Amount));
            fields.push(FormField::Ingredient(i, IngredientField::Unit));
        }
        fields.extend([
            FormField::Calories,
            FormField::Protein,
            FormField::Carbs,
            FormField::Fat,
            FormField::Instructions,
        ]);
        fields
    }

    fn focused(&self) -> FormField {
        let fields = self.fields();
        fields[self.focus.min(fields.len() - 1)]
    }

    fn move_focus(&mut self, delta: isize) {
        let len = self.fields().len() as isize;
        self.focus = (self.focus as isize + delta).rem_euclid(len) as usize;
    }

    fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        let d = &mut self.draft;
        match field {
            FormField::Title => Some(&mut d.title),
            FormField::Description => Some(&mut d.description),
            FormField::CookingTime => Some(&mut d.cooking_time),
            FormField::Servings => Some(&mut d.servings),
            FormField::Difficulty => None,
            FormField::ImageUrl => Some(&mut d.image_url),
            FormField::Ingredient(i, f) => d.ingredient_field_mut(i, f),
            FormField::Calories => Some(&mut d.macros.calories),
            FormField::Protein => Some(&mut d.macros.protein),
            FormField::Carbs => Some(&mut d.macros.carbs),
            FormField::Fat => Some(&mut d.macros.fat),
            FormField::Instructions => Some(&mut d.instructions),
        }
    }

    fn value(&self, field: FormField) -> String {
        let d = &self.draft;
        match field {
            FormField::Title => d.title.clone(),
            FormField::Description => d.description.clone(),
            FormField::CookingTime => d.cooking_time.clone(),
            FormField::Servings => d.servings.clone(),
            FormField::Difficulty => d
                .difficulty
                .map_or_else(|| "Select difficulty".to_string(), |x| x.label().to_string()),
            FormField::ImageUrl => d.image_url.clone(),
            FormField::Ingredient(i, f) => d
                .ingredients()
                .get(i)
                .map(|row| match f {
                    IngredientField::Name => row.name.clone(),
                    IngredientField::Amount => row.amount.clone(),
                    IngredientField::Unit => row.unit.clone(),
                })
                .unwrap_or_default(),
            FormField::Calories => d.macros.calories.clone(),
            FormField::Protein => d.macros.protein.clone(),
            FormField::Carbs => d.macros.carbs.clone(),
            FormField::Fat => d.macros.fat.clone(),
            FormField::Instructions => d.instructions.clone(),
        }
    }

    fn cycle_difficulty(&mut self, forward: bool) {
        let all = Difficulty::ALL;
        self.draft.difficulty = Some(match self.draft.difficulty {
            None => {
                if forward {
                    all[0]
                } else {
                    all[all.len() - 1]
                }
            }
            Some(current) => {
                let i = all.iter().position(|d| *d == current).unwrap_or(0);
                let len = all.len();
                if forward {
                    all[(i + 1) % len]
                } else {
                    all[(i + len - 1) % len]
                }
            }
        });
    }

    fn current_ingredient(&self) -> Option<usize> {
        match self.focused() {
            FormField::Ingredient(i, _) => Some(i),
            _ => None,
        }
    }
}

enum Screen {
    Landing(LandingScreen),
    Recipes(ListScreen),
    Detail(DetailScreen),
    New(NewScreen),
}

impl Screen {
    fn for_route(route: &Route) -> Self {
        match route {
            Route::Landing => Screen::Landing(LandingScreen {
                view: LandingView::new(),
                list_state: ListState::default(),
            }),
            Route::Recipes { search } => Screen::Recipes(ListScreen {
                view: RecipeListView::with_search(search.as_deref()),
                focus: FilterFocus::Title,
                list_state: ListState::default(),
            }),
            Route::Recipe(id) => Screen::Detail(DetailScreen {
                view: RecipeDetailView::new(id.clone()),
                scroll: 0,
            }),
            Route::NewRecipe => Screen::New(NewScreen::new()),
        }
    }

    fn has_pending(&self) -> bool {
        match self {
            Screen::Landing(s) => s.view.featured == Load::NotRequested,
            Screen::Recipes(s) => s.view.needs_refresh(),
            Screen::Detail(s) => s.view.recipe == Load::NotRequested,
            Screen::New(_) => false,
        }
    }

    fn begin(&mut self) {
        match self {
            Screen::Landing(s) => s.view.featured.begin(),
            Screen::Recipes(s) => s.view.begin_refresh(),
            Screen::Detail(s) => s.view.begin(),
            Screen::New(_) => {}
        }
    }

    fn resolve(&mut self, store: &dyn RecipeStore) {
        match self {
            Screen::Landing(s) => {
                s.view.load(store);
                clamp_selection(&mut s.list_state, s.view.featured.ready().map_or(0, Vec::len));
            }
            Screen::Recipes(s) => {
                s.view.refresh(store);
                clamp_selection(&mut s.list_state, s.view.recipes.ready().map_or(0, Vec::len));
            }
            Screen::Detail(s) => s.view.load(store),
            Screen::New(_) => {}
        }
    }
}

fn clamp_selection(state: &mut ListState, len: usize) {
    if len == 0 {
        state.select(None);
    } else {
        let i = state.selected().unwrap_or(0).min(len - 1);
        state.select(Some(i));
    }
}

fn step_selection(state: &mut ListState, len: usize, delta: isize) {
    if len == 0 {
        return;
    }
    let current = state.selected().unwrap_or(0) as isize;
    let next = (current + delta).clamp(0, len as isize - 1) as usize;
    state.select(Some(next));
}

// ── App ────────────────────────────────────────────────────────────

struct App {
    route: Route,
    screen: Screen,
    toast: Option<(Notification, Instant)>,
    status: String,
    alert: Option<Alert>,
    should_quit: bool,
}

impl App {
    fn new(route: Route) -> Self {
        Self {
            screen: Screen::for_route(&route),
            route,
            toast: None,
            status: String::new(),
            alert: None,
            should_quit: false,
        }
    }

    fn navigate(&mut self, route: Route) {
        info!(route = %route, "navigate");
        self.screen = Screen::for_route(&route);
        self.route = route;
        self.status.clear();
    }

    fn notify(&mut self, notification: Notification) {
        self.toast = Some((notification, Instant::now()));
    }

    fn submit_search(&mut self, store: &dyn RecipeStore) {
        let Screen::Landing(s) = &self.screen else {
            return;
        };
        match s.view.submit_search(store) {
            SearchOutcome::Ignored => {}
            SearchOutcome::Navigate(route) => self.navigate(route),
            SearchOutcome::NoMatches(alert) => self.alert = Some(alert),
            SearchOutcome::Failed(reason) => self.notify(Notification::error(&reason)),
        }
    }

    fn submit_recipe(&mut self, store: &dyn RecipeStore) {
        let Screen::New(s) = &self.screen else {
            return;
        };
        let outcome = s.draft.submit(store);
        if let SubmitOutcome::Invalid(reason) = &outcome {
            self.status = reason.clone();
            return;
        }
        if let Some(n) = outcome.notification() {
            self.notify(n.clone());
        }
        if let Some(route) = outcome.navigate() {
            self.navigate(route.clone());
        }
    }
}

// ── UI rendering ───────────────────────────────────────────────────

fn label(text: &str) -> Span<'static> {
    Span::styled(text.to_string(), Style::new().fg(Color::DarkGray))
}

fn focused_style(focused: bool) -> Style {
    if focused {
        Style::new().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::new()
    }
}

fn draw(frame: &mut Frame, app: &mut App) {
    let [header_area, body_area, help_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_header(frame, header_area, &app.route);

    match &mut app.screen {
        Screen::Landing(s) => draw_landing(frame, body_area, s),
        Screen::Recipes(s) => draw_recipes(frame, body_area, s),
        Screen::Detail(s) => draw_detail(frame, body_area, s),
        Screen::New(s) => draw_new(frame, body_area, s),
    }

    if let Some((_, shown)) = app.toast
        && shown.elapsed() > TOAST_TTL
    {
        app.toast = None;
    }

    let (help_text, help_style) = if let Some((n, _)) = &app.toast {
        let bg = if n.is_destructive() { Color::Red } else { Color::Green };
        (
            format!(" {}: {} ", n.title, n.description),
            Style::new().fg(Color::White).bg(bg),
        )
    } else if !app.status.is_empty() {
        (format!(" {} ", app.status), Style::new().fg(Color::Black).bg(Color::Yellow))
    } else {
        (help_for(&app.screen).to_string(), Style::new().fg(Color::Black).bg(Color::White))
    };
    frame.render_widget(Paragraph::new(help_text).style(help_style), help_area);

    if let Some(alert) = &app.alert {
        draw_alert(frame, alert);
    }
}

fn help_for(screen: &Screen) -> &'static str {
    match screen {
        Screen::Landing(_) => {
            " Type to search · [Enter] find/open · [↑/↓] featured · [F1-F3] nav · [Ctrl-C] quit"
        }
        Screen::Recipes(_) => {
            " [Tab] next filter · [←/→] adjust · [PgUp/PgDn] big step · [Enter] open · [Esc] home"
        }
        Screen::Detail(_) => " [↑/↓] scroll · [Esc] back to recipes · [F1-F3] nav",
        Screen::New(_) => {
            " [Tab/S-Tab] field · [Ctrl-N] add ingredient · [Ctrl-D] remove · [Ctrl-S] create · [Esc] home"
        }
    }
}

fn draw_header(frame: &mut Frame, area: Rect, route: &Route) {
    let mut spans = vec![Span::styled(
        " CookBook ",
        Style::new()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    for link in header_links(route) {
        let style = if link.active {
            Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::new().fg(Color::Gray)
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(format!("[F{}] {}", link.fkey, link.label), style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn recipe_card(recipe: &Recipe, with_macros: bool) -> ListItem<'static> {
    let mut lines = vec![
        Line::styled(recipe.title.clone(), Style::new().add_modifier(Modifier::BOLD)),
        Line::raw(recipe.description.lines().next().unwrap_or("").to_string()),
        Line::from(vec![
            label("⏱ "),
            Span::raw(format!("{} mins", recipe.cooking_time)),
            label("  •  "),
            Span::raw(recipe.difficulty.label()),
        ]),
    ];
    if with_macros {
        let m = recipe.macros;
        lines.push(Line::from(vec![
            label("Calories: "),
            Span::raw(format_amount(m.calories)),
            label("  Protein: "),
            Span::raw(format!("{} g", format_amount(m.protein))),
            label("  Carbs: "),
            Span::raw(format!("{} g", format_amount(m.carbs))),
            label("  Fat: "),
            Span::raw(format!("{} g", format_amount(m.fat))),
        ]));
    }
    lines.push(Line::raw(""));
    ListItem::new(lines)
}

fn draw_landing(frame: &mut Frame, area: Rect, s: &mut LandingScreen) {
    let [hero_area, list_area] =
        Layout::vertical([Constraint::Length(5), Constraint::Fill(1)]).areas(area);

    let hero = Paragraph::new(vec![
        Line::styled(
            "Discover & Share Amazing Recipes",
            Style::new().add_modifier(Modifier::BOLD),
        ),
        Line::raw("Join our community of food lovers and find your next favorite dish"),
        Line::from(vec![label("Search: "), Span::raw(format!("{}_", s.view.query))]),
    ])
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(hero, hero_area);

    let block = Block::default().borders(Borders::ALL).title("Featured Recipes");
    match &s.view.featured {
        Load::Ready(recipes) => {
            let items: Vec<ListItem> = recipes.iter().map(|r| recipe_card(r, false)).collect();
            let list = List::new(items)
                .block(block)
                .highlight_style(Style::new().fg(Color::Cyan))
                .highlight_symbol("▸ ");
            frame.render_stateful_widget(list, list_area, &mut s.list_state);
        }
        other => frame.render_widget(placeholder(other, "Loading recipes...", block), list_area),
    }
}

fn placeholder<'a, T>(load: &Load<T>, loading: &'a str, block: Block<'a>) -> Paragraph<'a> {
    let text = match load {
        Load::Failed(reason) => format!("Could not load: {reason}"),
        _ => loading.to_string(),
    };
    Paragraph::new(text).block(block)
}

fn draw_recipes(frame: &mut Frame, area: Rect, s: &mut ListScreen) {
    let [filter_area, results_area] =
        Layout::horizontal([Constraint::Length(32), Constraint::Fill(1)]).areas(area);

    let f = s.view.filter();
    let row = |focus: FilterFocus, name: &str, value: String| {
        Line::from(vec![
            label(name),
            Span::styled(value, focused_style(s.focus == focus)),
        ])
    };
    let filters = Paragraph::new(vec![
        row(FilterFocus::Title, "Search     ", format!("{}_", f.title)),
        row(
            FilterFocus::Difficulty,
            "Difficulty ",
            f.difficulty.map_or("Any difficulty", |d| d.label()).to_string(),
        ),
        Line::raw(""),
        label("Calories Range").into(),
        row(FilterFocus::CaloriesMin, "  min ", format!("{} cal", format_amount(f.calories.lo()))),
        row(FilterFocus::CaloriesMax, "  max ", format!("{} cal", format_amount(f.calories.hi()))),
        Line::raw(""),
        label("Protein Range").into(),
        row(FilterFocus::ProteinMin, "  min ", format!("{}g", format_amount(f.protein.lo()))),
        row(FilterFocus::ProteinMax, "  max ", format!("{}g", format_amount(f.protein.hi()))),
    ])
    .block(Block::default().borders(Borders::ALL).title("Filters"));
    frame.render_widget(filters, filter_area);

    let title = if s.focus == FilterFocus::Results {
        "Recipes ◂"
    } else {
        "Recipes"
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    match &s.view.recipes {
        Load::Ready(recipes) if recipes.is_empty() => {
            frame.render_widget(Paragraph::new(EMPTY_RESULTS).block(block), results_area);
        }
        Load::Ready(recipes) => {
            let items: Vec<ListItem> = recipes.iter().map(|r| recipe_card(r, true)).collect();
            let list = List::new(items)
                .block(block)
                .highlight_style(Style::new().fg(Color::Cyan))
                .highlight_symbol("▸ ");
            frame.render_stateful_widget(list, results_area, &mut s.list_state);
        }
        other => frame.render_widget(placeholder(other, "Loading recipes...", block), results_area),
    }
}

fn draw_detail(frame: &mut Frame, area: Rect, s: &DetailScreen) {
    let block = Block::default().borders(Borders::ALL);
    let recipe = match &s.view.recipe {
        Load::Ready(recipe) => recipe,
        Load::Failed(_) => {
            let msg = Paragraph::new(format!("Recipe {} not found.", s.view.id)).block(block);
            frame.render_widget(msg, area);
            return;
        }
        Load::NotRequested | Load::Pending => {
            frame.render_widget(Paragraph::new("Loading recipe...").block(block), area);
            return;
        }
    };

    let m = recipe.macros;
    let mut lines = vec![
        Line::styled(recipe.title.clone(), Style::new().add_modifier(Modifier::BOLD)),
        Line::raw(recipe.description.clone()),
        Line::raw(""),
        Line::from(vec![label("Image:  "), Span::raw(recipe.image_or_placeholder().to_string())]),
        Line::from(vec![
            label("⏱ "),
            Span::raw(format!("{} mins", recipe.cooking_time)),
            label("   Serves "),
            Span::raw(format!("{} servings", recipe.servings)),
            label("   Difficulty "),
            Span::raw(recipe.difficulty.label()),
        ]),
        Line::raw(""),
        Line::styled("Ingredients", Style::new().add_modifier(Modifier::UNDERLINED)),
    ];
    match &s.view.ingredients {
        Load::Ready(ingredients) => {
            for i in ingredients {
                lines.push(Line::from(vec![
                    Span::raw(format!("  {:<28}", i.name)),
                    label(&format!("{} {}", format_amount(i.amount), i.unit)),
                ]));
            }
        }
        Load::Failed(reason) => lines.push(Line::raw(format!("  Could not load: {reason}"))),
        _ => lines.push(Line::raw("  Loading...")),
    }
    lines.extend([
        Line::raw(""),
        Line::styled(
            "Nutritional Information (per serving)",
            Style::new().add_modifier(Modifier::UNDERLINED),
        ),
        Line::from(vec![
            label("  Calories "),
            Span::raw(format_amount(m.calories)),
            label("   Protein "),
            Span::raw(format!("{}g", format_amount(m.protein))),
            label("   Carbs "),
            Span::raw(format!("{}g", format_amount(m.carbs))),
            label("   Fat "),
            Span::raw(format!("{}g", format_amount(m.fat))),
        ]),
        Line::raw(""),
        Line::styled("Instructions", Style::new().add_modifier(Modifier::UNDERLINED)),
    ]);
    for p in paragraphs(&recipe.instructions) {
        lines.push(Line::raw(p.to_string()));
        lines.push(Line::raw(""));
    }

    let body = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((s.scroll, 0));
    frame.render_widget(body, area);
}

fn draw_new(frame: &mut Frame, area: Rect, s: &NewScreen) {
    let focused = s.focused();
    let mut lines = vec![Line::styled(
        "Create New Recipe",
        Style::new().add_modifier(Modifier::BOLD),
    )];
    let mut focus_line = 0u16;
    for field in s.fields() {
        if matches!(field, FormField::Ingredient(0, IngredientField::Name)) {
            lines.push(Line::styled("Ingredients", Style::new().add_modifier(Modifier::UNDERLINED)));
        }
        if field == FormField::Calories {
            lines.push(Line::styled(
                "Nutritional Information (per serving)",
                Style::new().add_modifier(Modifier::UNDERLINED),
            ));
        }
        if field == focused {
            focus_line = lines.len() as u16;
        }
        let cursor = if field == focused && field != FormField::Difficulty { "_" } else { "" };
        let value = s.value(field);
        if field == FormField::Instructions {
            lines.push(Line::from(label(&format!("{:<24}", field.label()))));
            for (i, p) in value.split('\n').enumerate() {
                let last = i == value.split('\n').count() - 1;
                lines.push(Line::styled(
                    format!("  {p}{}", if last { cursor } else { "" }),
                    focused_style(field == focused),
                ));
            }
        } else {
            lines.push(Line::from(vec![
                label(&format!("{:<24}", field.label())),
                Span::styled(format!("{value}{cursor}"), focused_style(field == focused)),
            ]));
        }
    }

    let visible = area.height.saturating_sub(2);
    let scroll = if focus_line >= s.scroll + visible {
        focus_line + 1 - visible
    } else {
        s.scroll.min(focus_line)
    };

    let body = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .scroll((scroll, 0));
    frame.render_widget(body, area);
}

fn draw_alert(frame: &mut Frame, alert: &Alert) {
    let area = frame.area();
    let width = (alert.message.chars().count() as u16 + 6).min(area.width);
    let height = 5u16.min(area.height);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };
    frame.render_widget(Clear, popup);
    let body = Paragraph::new(vec![
        Line::raw(alert.message.clone()),
        Line::raw(""),
        Line::styled("[Enter] OK", Style::new().fg(Color::DarkGray)),
    ])
    .block(Block::default().borders(Borders::ALL).title("Alert"));
    frame.render_widget(body, popup);
}

// ── Event handling ─────────────────────────────────────────────────

fn header_route(key: &KeyEvent) -> Option<Route> {
    let KeyCode::F(n) = key.code else {
        return None;
    };
    header_links(&Route::Landing)
        .into_iter()
        .find(|l| l.fkey == n)
        .map(|l| l.route)
}

fn handle_event(app: &mut App, store: &dyn RecipeStore) -> std::io::Result<()> {
    if !event::poll(Duration::from_millis(250))? {
        return Ok(());
    }

    let Event::Key(key) = event::read()? else {
        return Ok(());
    };
    if key.kind == KeyEventKind::Press {
        handle_key(app, store, key);
    }
    Ok(())
}

fn handle_key(app: &mut App, store: &dyn RecipeStore, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    if app.alert.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.alert = None;
        }
        return;
    }

    if let Some(route) = header_route(&key) {
        app.navigate(route);
        return;
    }

    match &mut app.screen {
        Screen::Landing(s) => {
            let featured_len = s.view.featured.ready().map_or(0, Vec::len);
            match key.code {
                KeyCode::Esc => app.should_quit = true,
                KeyCode::Up => step_selection(&mut s.list_state, featured_len, -1),
                KeyCode::Down => step_selection(&mut s.list_state, featured_len, 1),
                KeyCode::Backspace => {
                    s.view.query.pop();
                }
                KeyCode::Char(c) if !ctrl => s.view.query.push(c),
                KeyCode::Enter if !s.view.query.trim().is_empty() => app.submit_search(store),
                KeyCode::Enter => {
                    let id = s
                        .list_state
                        .selected()
                        .and_then(|i| s.view.featured.ready().and_then(|r| r.get(i)))
                        .map(|r| r.id.clone());
                    if let Some(id) = id {
                        app.navigate(Route::Recipe(id));
                    }
                }
                _ => {}
            }
        }
        Screen::Recipes(s) => {
            let results_len = s.view.recipes.ready().map_or(0, Vec::len);
            match (s.focus, key.code) {
                (_, KeyCode::Esc) => app.navigate(Route::Landing),
                (_, KeyCode::Tab) => s.focus = s.focus.shift(1),
                (_, KeyCode::BackTab) => s.focus = s.focus.shift(-1),
                (FilterFocus::Title, KeyCode::Backspace) => s.view.update(|f| {
                    f.title.pop();
                }),
                (FilterFocus::Title, KeyCode::Char(c)) if !ctrl => {
                    s.view.update(|f| f.title.push(c));
                }
                (FilterFocus::Difficulty, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) => {
                    s.view.update(|f| f.cycle_difficulty());
                }
                (focus, code) if is_range(focus) => {
                    let steps = match code {
                        KeyCode::Left => -1,
                        KeyCode::Right => 1,
                        KeyCode::PageDown => -RANGE_PAGE,
                        KeyCode::PageUp => RANGE_PAGE,
                        _ => 0,
                    };
                    if steps != 0 {
                        s.view.update(|f| match focus {
                            FilterFocus::CaloriesMin => f.calories.step_lo(steps),
                            FilterFocus::CaloriesMax => f.calories.step_hi(steps),
                            FilterFocus::ProteinMin => f.protein.step_lo(steps),
                            _ => f.protein.step_hi(steps),
                        });
                    }
                }
                (FilterFocus::Results, KeyCode::Up) => step_selection(&mut s.list_state, results_len, -1),
                (FilterFocus::Results, KeyCode::Down) => step_selection(&mut s.list_state, results_len, 1),
                (_, KeyCode::Enter) => {
                    let id = s
                        .list_state
                        .selected()
                        .and_then(|i| s.view.recipes.ready().and_then(|r| r.get(i)))
                        .map(|r| r.id.clone());
                    if let Some(id) = id {
                        app.navigate(Route::Recipe(id));
                    }
                }
                _ => {}
            }
        }
        Screen::Detail(s) => match key.code {
            KeyCode::Esc => app.navigate(Route::Recipes { search: None }),
            KeyCode::Down | KeyCode::Char('j') => s.scroll = s.scroll.saturating_add(1),
            KeyCode::Up | KeyCode::Char('k') => s.scroll = s.scroll.saturating_sub(1),
            KeyCode::PageDown => s.scroll = s.scroll.saturating_add(10),
            KeyCode::PageUp => s.scroll = s.scroll.saturating_sub(10),
            _ => {}
        },
        Screen::New(s) => {
            app.status.clear();
            let field = s.focused();
            match key.code {
                KeyCode::Esc => app.navigate(Route::Landing),
                KeyCode::Char('s') if ctrl => app.submit_recipe(store),
                KeyCode::Char('n') if ctrl => s.draft.add_ingredient(),
                KeyCode::Char('d') if ctrl => {
                    if let Some(i) = s.current_ingredient()
                        && s.draft.remove_ingredient(i)
                    {
                        s.focus = s.focus.min(s.fields().len() - 1);
                    }
                }
                KeyCode::Tab | KeyCode::Down => s.move_focus(1),
                KeyCode::BackTab | KeyCode::Up => s.move_focus(-1),
                KeyCode::Left if field == FormField::Difficulty => s.cycle_difficulty(false),
                KeyCode::Right | KeyCode::Char(' ') if field == FormField::Difficulty => {
                    s.cycle_difficulty(true);
                }
                KeyCode::Enter if field == FormField::Instructions => s.draft.instructions.push('\n'),
                KeyCode::Enter => s.move_focus(1),
                KeyCode::Backspace => {
                    if let Some(text) = s.text_mut(field) {
                        text.pop();
                    }
                }
                KeyCode::Char(c) if !ctrl => {
                    if let Some(text) = s.text_mut(field) {
                        text.push(c);
                    }
                }
                _ => {}
            }
        }
    }
}

fn is_range(focus: FilterFocus) -> bool {
    matches!(
        focus,
        FilterFocus::CaloriesMin
            | FilterFocus::CaloriesMax
            | FilterFocus::ProteinMin
            | FilterFocus::ProteinMax
    )
}

// ── Entry point ────────────────────────────────────────────────────

pub fn run(paths: &AppPaths, start: Route) -> Result<()> {
    let store = SqliteStore::open(&paths.db_path)?;
    run_with(&store, start)
}

pub fn run_with(store: &dyn RecipeStore, start: Route) -> Result<()> {
    let mut app = App::new(start);
    let mut terminal = ratatui::init();

    let result = (|| {
        loop {
            if app.screen.has_pending() {
                app.screen.begin();
                terminal.draw(|frame| draw(frame, &mut app))?;
                app.screen.resolve(store);
            }
            terminal.draw(|frame| draw(frame, &mut app))?;
            handle_event(&mut app, store)?;
            if app.should_quit {
                break;
            }
        }
        Ok::<(), std::io::Error>(())
    })();

    ratatui::restore();

    result.map_err(Into::into)
}
