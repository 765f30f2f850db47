//! UI rendering for the monitor.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph},
    style::{Color, Modifier, Style},
};

use super::app::MonitorApp;
use crate::bits;
use crate::cpu::{ControlLine, MachineSnapshot};

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &MonitorApp) {
    let snapshot = app.snapshot();

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(frame.area());

    // Left side: machine state, debugger dump, status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(12),
            Constraint::Length(5),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_registers(frame, left_chunks[0], &snapshot);
    draw_control_lines(frame, left_chunks[1], &snapshot);
    draw_debugger(frame, left_chunks[2], app);
    draw_status(frame, left_chunks[3], app);

    // Right side: memory, output, help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(4),
            Constraint::Length(5),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_output(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

fn binary(snapshot: &MachineSnapshot, value: u64) -> String {
    bits::format_bits(&bits::to_bits(value, snapshot.bits))
}

fn register_line<'a>(label: &'a str, snapshot: &MachineSnapshot, value: u64, color: Color) -> Line<'a> {
    Line::from(vec![
        Span::raw(format!("{:<10}", label)),
        Span::styled(binary(snapshot, value), Style::default().fg(color)),
        Span::raw(format!("  0x{:02X}  {:>5}", value, value)),
    ])
}

/// Draw register and bus state.
fn draw_registers(frame: &mut Frame, area: Rect, snapshot: &MachineSnapshot) {
    let content = vec![
        register_line("Bus", snapshot, snapshot.bus, Color::Cyan),
        register_line("A", snapshot, snapshot.reg_a, Color::White),
        register_line("B", snapshot, snapshot.reg_b, Color::White),
        register_line("ALU", snapshot, snapshot.alu, Color::Gray),
        register_line("Instr", snapshot, snapshot.instruction, Color::Yellow),
        register_line("Counter", snapshot, snapshot.counter, Color::Yellow),
        register_line("RAM", snapshot, snapshot.ram, Color::Magenta),
        Line::from(vec![
            Span::raw("RAM addr: "),
            Span::styled(format!("0x{:02X}", snapshot.ram_address), Style::default().fg(Color::Magenta)),
            Span::raw("   Step: "),
            Span::styled(format!("{}", snapshot.pointer), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::raw("Ticks: "),
            Span::styled(format!("{}", snapshot.tick), Style::default().fg(Color::Cyan)),
            Span::raw("   State: "),
            Span::styled(
                if snapshot.halted { "Halted" } else { "Live" },
                if snapshot.halted {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default().fg(Color::Green)
                },
            ),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Every control line, lit when asserted in the last tick.
fn draw_control_lines(frame: &mut Frame, area: Rect, snapshot: &MachineSnapshot) {
    let spans: Vec<Span> = ControlLine::ALL
        .into_iter()
        .map(|line| {
            let style = if snapshot.control.contains(line) {
                Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(format!(" {} ", line.mnemonic()), style)
        })
        .collect();

    let (first, second) = spans.split_at(spans.len() / 2);
    let paragraph = Paragraph::new(vec![Line::from(first.to_vec()), Line::from(second.to_vec())])
        .block(Block::default()
            .title(" Control lines ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)));

    frame.render_widget(paragraph, area);
}

fn draw_debugger(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let dump = app.debug_dump();
    let lines: Vec<Line> = dump.lines().map(|l| Line::from(l.to_string())).collect();

    let paragraph = Paragraph::new(lines)
        .style(Style::default().fg(Color::Red))
        .block(Block::default()
            .title(" Debugger ")
            .borders(Borders::ALL));

    frame.render_widget(paragraph, area);
}

/// Draw memory view with disassembly.
fn draw_memory(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);

    let items: Vec<ListItem> = app
        .memory_rows(visible_rows)
        .into_iter()
        .map(|(addr, word, text, selected)| {
            let prefix = if selected { "▶ " } else { "  " };
            let line = format!("{}{:04X}: {:04X}  {}", prefix, addr, word, text);

            let style = if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if word != 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(line).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

fn draw_output(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let outputs = app.outputs();
    let latest = outputs
        .last()
        .map_or_else(|| "-".to_string(), |v| v.to_string());
    let history: Vec<String> = outputs.iter().rev().skip(1).take(8).map(u64::to_string).collect();

    let paragraph = Paragraph::new(vec![
        Line::from(vec![
            Span::raw("Output: "),
            Span::styled(latest, Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(Span::styled(history.join(" "), Style::default().fg(Color::DarkGray))),
    ])
    .block(Block::default()
        .title(" Output ")
        .borders(Borders::ALL));

    frame.render_widget(paragraph, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let clock = app.computer.clock();
    let text = format!(
        "{}  [{:?}, {} dropped]",
        app.status,
        clock.interval(),
        clock.dropped_ticks()
    );
    let status = Paragraph::new(text)
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("t/Space: Run/pause  s: Step  q: Quit"),
        Line::from("←: Slower  →: Faster"),
        Line::from("↑↓: Scroll memory"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
