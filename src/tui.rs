use crate::games::kalah::{Board, Game, Player, Ply, Status};
use crate::status::StatusReport;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{self, Modifier, Style};
use ratatui::text::Span;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Stylize,
    symbols::border,
    text::{Line, Text},
    widgets::{Block, Paragraph, Widget},
};

#[derive(Clone)]
pub struct InteractiveApp {
    pub game: Game,
    pub selected: usize,
    pub ply: usize,
    pub last_move: Option<Ply>,
    pub message: Option<String>,
}

fn player_color(player: Player) -> style::Color {
    match player {
        Player::One => style::Color::Blue,
        Player::Two => style::Color::Red,
    }
}

impl InteractiveApp {
    pub fn new(game: Game) -> Self {
        let mut app = Self {
            game,
            selected: 0,
            ply: 0,
            last_move: None,
            message: None,
        };
        app.select_first();
        app
    }

    // Pits the active player may pick, in board order
    fn own_pits(&self) -> Vec<usize> {
        let board = self.game.board();
        (0..board.len())
            .filter(|&pit| board.side_of(pit) == Some(self.game.player()))
            .collect()
    }

    pub fn select_first(&mut self) {
        if let Some(&pit) = self.own_pits().first() {
            self.selected = pit;
        }
    }

    pub fn select_next(&mut self) {
        let pits = self.own_pits();
        match pits.iter().position(|&p| p == self.selected) {
            Some(idx) if idx + 1 < pits.len() => self.selected = pits[idx + 1],
            Some(_) => {}
            None => self.select_first(),
        }
    }

    pub fn select_previous(&mut self) {
        let pits = self.own_pits();
        match pits.iter().position(|&p| p == self.selected) {
            Some(idx) if idx > 0 => self.selected = pits[idx - 1],
            Some(_) => {}
            None => self.select_first(),
        }
    }

    fn pit_span(&self, board: &Board, pit: usize) -> Span<'static> {
        let text = format!(" {:>2} ", board.pits()[pit]);
        let owner = board.side_of(pit);
        if pit == self.selected && owner == Some(self.game.player()) && self.game.status() == Status::Playable {
            Span::styled(text, Style::default().fg(player_color(self.game.player())).add_modifier(Modifier::REVERSED | Modifier::BOLD))
        } else {
            match owner {
                Some(player) => Span::styled(text, Style::default().fg(player_color(player))),
                None => Span::styled(text, Style::default().fg(style::Color::Gray)),
            }
        }
    }

    // Player TWO's pits run right to left along the top, player ONE's left to
    // right along the bottom, stores at the ends.
    fn board_lines(&self) -> Vec<Line<'static>> {
        let board = self.game.board();
        let one_base = board.player_one_base();
        let two_base = board.player_two_base();

        let mut top = vec![Span::raw("        ")];
        for pit in (one_base + 1..two_base).rev() {
            top.push(self.pit_span(board, pit));
        }

        let width = 4 * one_base;
        let middle = vec![
            Span::raw("  "),
            Span::styled(format!("[{:>2}]", board.score(Player::Two)), Style::default().fg(player_color(Player::Two)).bold()),
            Span::raw(" ".repeat(width + 4)),
            Span::styled(format!("[{:>2}]", board.score(Player::One)), Style::default().fg(player_color(Player::One)).bold()),
        ];

        let mut bottom = vec![Span::raw("        ")];
        for pit in 0..one_base {
            bottom.push(self.pit_span(board, pit));
        }

        let mut indices = vec![Span::raw("        ")];
        for pit in 0..one_base {
            indices.push(Span::styled(format!(" {:>2} ", pit), Style::default().fg(style::Color::DarkGray)));
        }

        vec![Line::from(""), Line::from(top), Line::from(middle), Line::from(bottom), Line::from(indices)]
    }
}

impl Widget for InteractiveApp {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(8),
                Constraint::Length(4),
                Constraint::Length(11),
            ])
            .split(area);

        let header_text = Text::from(vec![Line::from(vec![
            " ".into(),
            if self.game.status() == Status::Done {
                Span::styled(" GAME OVER ", Style::default().fg(style::Color::Red)).bold().add_modifier(Modifier::SLOW_BLINK | Modifier::REVERSED)
            } else {
                Span::styled(" GAME RUNNING ", Style::default().fg(style::Color::Blue)).bold().add_modifier(Modifier::REVERSED)
            },
            format!(" Game: {}, ", self.game.id()).into(),
            format!("Current Player: {}, ", self.game.player()).into(),
            format!("Ply: {}", self.ply).into(),
        ])]);

        Paragraph::new(header_text)
            .block(Block::bordered().border_set(border::THICK))
            .render(layout[0], buf);

        Paragraph::new(self.board_lines())
            .block(Block::bordered().title(Line::from(" Board ".bold())))
            .render(layout[1], buf);

        let mut move_lines = Vec::new();
        match self.last_move {
            Some(ply) => {
                let mut line = vec![
                    format!("  Last Move by {}: ", ply.player).italic(),
                    format!("pit {} landed on {}", ply.pit, ply.landed).into(),
                ];
                if ply.captured > 0 {
                    line.push(format!(", captured {}", ply.captured).bold());
                }
                if ply.extra_turn {
                    line.push(", extra turn".bold());
                }
                move_lines.push(Line::from(line));
            }
            None => move_lines.push("  Last Move: NA".italic().into()),
        }
        if let Some(message) = &self.message {
            move_lines.push(Line::from(Span::styled(format!("  {}", message), Style::default().fg(style::Color::Red))));
        }
        Paragraph::new(move_lines)
            .block(Block::bordered())
            .render(layout[2], buf);

        let report = StatusReport::of(&self.game).to_string();
        let report_lines: Vec<Line> = report.lines().map(|l| Line::from(format!("  {}", l))).collect();

        let block = Block::bordered()
            .title(Line::from(" Status ".bold()).centered())
            .title_bottom(Line::from(vec![
                " Select ".into(),
                "<←/→> ".blue().bold(),
                " Greedy Play ".into(),
                "<SPC> ".blue().bold(),
                " Sow ".into(),
                "<RET> ".blue().bold(),
                " Clear ".into(),
                "<c> ".blue().bold(),
                " Quit ".into(),
                "<q> ".blue().bold(),
            ]).right_aligned());

        Paragraph::new(report_lines)
            .block(block)
            .render(layout[3], buf);
    }
}
