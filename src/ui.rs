use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Span, Spans},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::chart::{self, TerminalChart, TerminalSeries};
use crate::selection::{AppState, LoadState};

const KEY_HELP: &[&str] = &["Tab", "Enter", "Space", "Clear", "Reset", "[ ] series", "Export", "Quit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Counties,
    Cities,
}

impl From<Focus> for usize {
    fn from(input: Focus) -> usize {
        match input {
            Focus::Counties => 0,
            Focus::Cities => 1,
        }
    }
}

/// Cursor positions and transient status; never feeds back into the data.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub focus: Focus,
    pub county_cursor: usize,
    pub city_cursor: usize,
    pub highlighted: usize,
    pub message: Option<String>,
}

impl ViewState {
    pub fn new(app: &AppState) -> Self {
        ViewState {
            county_cursor: app
                .dataset()
                .counties
                .iter()
                .position(|county| county == app.county())
                .unwrap_or(0),
            ..ViewState::default()
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Counties => Focus::Cities,
            Focus::Cities => Focus::Counties,
        };
    }

    pub fn move_cursor(&mut self, up: bool, app: &AppState) {
        let (cursor, len) = match self.focus {
            Focus::Counties => (&mut self.county_cursor, app.dataset().counties.len()),
            Focus::Cities => (&mut self.city_cursor, app.dataset().cities.len()),
        };
        if up {
            *cursor = cursor.saturating_sub(1);
        } else if *cursor + 1 < len {
            *cursor += 1;
        }
    }

    pub fn cycle_highlight(&mut self, forward: bool, len: usize) {
        if len == 0 {
            self.highlighted = 0;
        } else if forward {
            self.highlighted = (self.highlighted + 1) % len;
        } else {
            self.highlighted = (self.highlighted + len - 1) % len;
        }
    }

    /// Keeps every cursor inside the current lists.
    pub fn clamp(&mut self, app: &AppState) {
        let last = |len: usize| len.saturating_sub(1);
        self.county_cursor = self.county_cursor.min(last(app.dataset().counties.len()));
        self.city_cursor = self.city_cursor.min(last(app.dataset().cities.len()));
        self.highlighted = self.highlighted.min(last(app.visible().len()));
    }
}

/// Title line for the highlighted series: its city and the plotted value
/// for every year.
pub fn tooltip(app: &AppState, series: Option<&TerminalSeries>) -> String {
    let Some((series, city)) = series.and_then(|s| {
        chart::tooltip_title(app.visible(), &s.name).map(|city| (s, city))
    }) else {
        return "no cities selected".to_string();
    };
    let values: Vec<String> = app
        .dataset()
        .categories
        .iter()
        .enumerate()
        .map(|(x, year)| {
            let value = series
                .points
                .iter()
                .find(|(px, _)| *px as usize == x)
                .map(|(_, y)| y.to_string())
                .unwrap_or_else(|| "-".to_string());
            format!("{}: {}", year, value)
        })
        .collect();
    format!("{}  {}", city, values.join("  "))
}

fn status_line(app: &AppState) -> Spans<'static> {
    let dataset = app.dataset();
    match app.load_state() {
        LoadState::Loading => Spans::from(Span::styled("Loading data", Style::default().fg(Color::Yellow))),
        state @ LoadState::Failed { .. } => Spans::from(Span::styled(
            state.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        state @ LoadState::Loaded { .. } if dataset.is_empty() => Spans::from(Span::styled(
            format!("{}: the file has no rows", state),
            Style::default().fg(Color::Yellow),
        )),
        state @ LoadState::Loaded { .. } => Spans::from(Span::styled(
            format!(
                "{}: {} cities in {} counties, {} years",
                state,
                dataset.cities.len(),
                dataset.counties.len(),
                dataset.categories.len()
            ),
            Style::default().fg(Color::Green),
        )),
    }
}

fn draw_header<B: Backend>(rect: &mut Frame<B>, area: Rect, app: &AppState, view: &ViewState) {
    let header_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(area);

    let menu = ["Counties", "Cities"]
        .iter()
        .map(|t| Spans::from(Span::raw(*t)))
        .collect();
    let tabs = Tabs::new(menu)
        .select(view.focus.into())
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Cyan))
        .highlight_style(Style::default().fg(Color::Yellow))
        .divider(Span::raw("|"));
    rect.render_widget(tabs, header_chunks[0]);

    let keys = KEY_HELP
        .iter()
        .flat_map(|t| {
            let (first, rest) = t.split_at(1);
            [
                Span::styled(
                    first,
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::UNDERLINED),
                ),
                Span::styled(format!("{}  ", rest), Style::default().fg(Color::DarkGray)),
            ]
        })
        .collect::<Vec<_>>();
    let mut lines = vec![status_line(app), Spans::from(keys)];
    if let Some(message) = &view.message {
        lines.push(Spans::from(Span::raw(message.clone())));
    }
    let status = Paragraph::new(lines)
        .block(Block::default().title(format!("County: {}", app.county())).borders(Borders::ALL))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    rect.render_widget(status, header_chunks[1]);
}

fn list_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    }
}

fn draw_lists<B: Backend>(rect: &mut Frame<B>, area: Rect, app: &AppState, view: &ViewState) {
    let list_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)].as_ref())
        .split(area);

    let counties: Vec<ListItem> = app
        .dataset()
        .counties
        .iter()
        .map(|county| {
            let marker = if county == app.county() { "* " } else { "  " };
            ListItem::new(format!("{}{}", marker, county))
        })
        .collect();
    let mut county_state = ListState::default();
    county_state.select(Some(view.county_cursor).filter(|_| !counties.is_empty()));
    let county_list = List::new(counties)
        .block(Block::default().title("County").borders(Borders::ALL))
        .highlight_style(list_style(view.focus == Focus::Counties));
    rect.render_stateful_widget(county_list, list_chunks[0], &mut county_state);

    let cities: Vec<ListItem> = app
        .dataset()
        .cities
        .iter()
        .map(|option| {
            let position = app.visible().iter().position(|r| r.city == option.label);
            let style = position
                .map(|index| Style::default().fg(chart::series_terminal_color(index)))
                .unwrap_or_default();
            let check = if app.is_selected(&option.label) { "[x] " } else { "[ ] " };
            ListItem::new(Spans::from(vec![
                Span::raw(check),
                Span::styled(option.label.clone(), style),
            ]))
        })
        .collect();
    let mut city_state = ListState::default();
    city_state.select(Some(view.city_cursor).filter(|_| !cities.is_empty()));
    let city_list = List::new(cities)
        .block(
            Block::default()
                .title(format!("Cities ({} selected)", app.selected().len()))
                .borders(Borders::ALL),
        )
        .highlight_style(list_style(view.focus == Focus::Cities));
    rect.render_stateful_widget(city_list, list_chunks[1], &mut city_state);
}

fn draw_chart<B: Backend>(rect: &mut Frame<B>, area: Rect, app: &AppState, view: &ViewState) {
    let TerminalChart {
        series,
        x_bounds,
        y_bounds,
        x_labels,
        y_labels,
    } = chart::terminal_chart(app.visible(), &app.dataset().categories);

    let datasets = series
        .iter()
        .enumerate()
        .map(|(index, s)| {
            let mut style = Style::default().fg(s.color);
            if index == view.highlighted {
                style = style.add_modifier(Modifier::BOLD);
            }
            Dataset::default()
                .name(s.name.as_str())
                .marker(if index == view.highlighted {
                    symbols::Marker::Block
                } else {
                    symbols::Marker::Braille
                })
                .graph_type(GraphType::Line)
                .style(style)
                .data(&s.points)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(tooltip(app, series.get(view.highlighted)))
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("Year")
                .style(Style::default().fg(Color::Gray))
                .bounds(x_bounds)
                .labels(x_labels.into_iter().map(Span::raw).collect()),
        )
        .y_axis(
            Axis::default()
                .title("Per capita")
                .style(Style::default().fg(Color::Gray))
                .bounds(y_bounds)
                .labels(y_labels.into_iter().map(Span::raw).collect()),
        )
        .hidden_legend_constraints((Constraint::Length(0), Constraint::Length(0)));
    rect.render_widget(chart, area);
}

pub fn draw<B: Backend>(rect: &mut Frame<B>, app: &AppState, view: &ViewState) {
    let size = rect.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(6), Constraint::Min(10)].as_ref())
        .split(size);
    draw_header(rect, chunks[0], app, view);

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25), Constraint::Percentage(75)].as_ref())
        .split(chunks[1]);
    draw_lists(rect, body_chunks[0], app, view);
    draw_chart(rect, body_chunks[1], app, view);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_reader::parse_rows;
    use crate::dataset::build_dataset;
    use crate::selection::SelectionController;
    use tui::{backend::TestBackend, Terminal};

    fn app() -> AppState {
        let mut app = AppState::new("Marin");
        let rows = parse_rows(
            "City,County,2010,2011\nNovato,Marin,10,N/A\nFairfax,Marin,8,9\nOakland,Alameda,20,22\n",
        )
        .unwrap();
        app.finish_load(Ok(build_dataset(&rows)));
        app
    }

    fn render(app: &AppState, view: &ViewState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| draw(f, app, view)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol.as_str())
            .collect()
    }

    #[test]
    fn view_starts_on_the_active_county() {
        let mut app = app();
        app.set_county("Alameda");
        let view = ViewState::new(&app);
        assert_eq!(view.county_cursor, 1);
        assert_eq!(view.focus, Focus::Counties);
    }

    #[test]
    fn cursors_stay_inside_their_lists() {
        let app = app();
        let mut view = ViewState::new(&app);
        view.move_cursor(true, &app);
        assert_eq!(view.county_cursor, 0);
        for _ in 0..5 {
            view.move_cursor(false, &app);
        }
        assert_eq!(view.county_cursor, 1);

        view.toggle_focus();
        for _ in 0..5 {
            view.move_cursor(false, &app);
        }
        assert_eq!(view.city_cursor, 2);
    }

    #[test]
    fn highlight_wraps_and_clamps() {
        let mut app = app();
        let mut view = ViewState::new(&app);
        view.cycle_highlight(false, app.visible().len());
        assert_eq!(view.highlighted, 1);
        view.cycle_highlight(true, app.visible().len());
        assert_eq!(view.highlighted, 0);

        view.highlighted = 1;
        app.set_county("Alameda");
        view.clamp(&app);
        assert_eq!(view.highlighted, 0);
    }

    #[test]
    fn tooltip_names_the_highlighted_city_and_its_values() {
        let mut app = app();
        let plotted = chart::terminal_chart(app.visible(), &app.dataset().categories);
        assert_eq!(tooltip(&app, plotted.series.first()), "Novato  2010: 10  2011: -");
        assert_eq!(tooltip(&app, plotted.series.get(1)), "Fairfax  2010: 8  2011: 9");

        app.set_selected_cities(None);
        assert_eq!(tooltip(&app, plotted.series.first()), "no cities selected");
        assert_eq!(tooltip(&app, None), "no cities selected");
    }

    #[test]
    fn screen_shows_lists_and_chart() {
        let app = app();
        let screen = render(&app, &ViewState::new(&app));
        assert!(screen.contains("County: Marin"));
        assert!(screen.contains("[x] Novato"));
        assert!(screen.contains("[ ] Oakland"));
        assert!(screen.contains("Cities (2 selected)"));
        assert!(screen.contains("3 cities in 2 counties"));
    }

    #[test]
    fn failed_load_is_shown() {
        let mut app = AppState::new("Marin");
        app.finish_load(parse_rows("").map(|rows| build_dataset(&rows)));
        assert!(render(&app, &ViewState::new(&app)).contains("the file has no rows"));

        let dir = tempfile::tempdir().unwrap();
        let mut app = AppState::new("Marin");
        app.finish_load(
            crate::csv_reader::read_rows(&dir.path().join("missing.csv")).map(|rows| build_dataset(&rows)),
        );
        assert!(render(&app, &ViewState::new(&app)).contains("Failed to load data"));
    }
}
