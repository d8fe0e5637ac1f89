// SPDX: CC0-1.0

use anyhow::Context;
use chrono::{DateTime, Local};
use core::num::NonZeroU16;
use sci_calc::{
    buffer::InputBuffer,
    compile, format,
    sample::{self, segments, SampleResult},
    shell::{self, Command, Level},
    stdlib::X,
    AngleMode, Error, EvalCtx, Number, Window,
};
use std::{
    fs::{File, OpenOptions},
    io::{self, stderr, stdout, BufWriter, Write},
    process::ExitCode,
};

fn output_data_filename(now: DateTime<Local>, attempt: u32) -> String {
    let suffix = if attempt == 0 {
        String::new()
    } else {
        format!("-{attempt}")
    };
    format!(
        "{}_output-{}{suffix}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S%.3f"),
        "data"
    )
}

fn create_data_file() -> io::Result<(String, File)> {
    let now = Local::now();
    let mut attempt = 0;
    loop {
        let path = output_data_filename(now, attempt);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists && attempt < 100 => {
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn write_data(file: File, samples: &SampleResult) -> anyhow::Result<()> {
    let mut data = BufWriter::new(file);
    // blank lines separate segments, so gaps stay gaps when drawn
    for segment in segments(samples) {
        for p in segment {
            writeln!(data, "{} {}", p.x, p.y).context("failed to write to output data file")?;
        }
        writeln!(data).context("failed to write to output data file")?;
    }
    data.flush().context("failed to write to output data file")?;
    data.get_mut()
        .sync_data()
        .context("failed to sync output data file")?;
    Ok(())
}

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug)]
struct State {
    buffer: InputBuffer,
    ctx: EvalCtx,
    win: Window,
}

fn try_main() -> anyhow::Result<()> {
    let mut state = State {
        buffer: InputBuffer::new(),
        ctx: EvalCtx::default(),
        win: Window::default(),
    };

    let mut stdout = BufWriter::new(stdout());
    loop {
        if state.buffer.is_empty() {
            writeln!(stdout, "input is empty ({})", state.ctx.angle_mode)?;
        } else {
            writeln!(
                stdout,
                "input = {} ({})",
                state.buffer.text(),
                state.ctx.angle_mode
            )?;
        }

        let Some(mut try_cmd) = shell::input(&mut stdout, "> ")? else {
            break;
        };
        try_cmd.make_ascii_lowercase();
        writeln!(stdout)?;

        if let Ok(cmd) = try_cmd.parse::<Command>() {
            match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(stdout, "{name}: {help}", name = c.name(), help = c.help())?;
                    }
                }

                Command::Quit => break,

                Command::Set => {
                    if let Some(text) = shell::input(&mut stdout, "input = ")? {
                        state.buffer.set(text);
                    }
                }

                Command::Append => {
                    if let Some(text) = shell::input(&mut stdout, "append: ")? {
                        state.buffer.push(&text);
                    }
                }

                Command::Delete => state.buffer.delete_last(),

                Command::Clear => state.buffer.clear(),

                Command::Negate => state.buffer.toggle_sign(),

                Command::Percent => state.buffer.percent(),

                Command::Wrap => wrap(&mut stdout, &mut state)?,

                Command::Eval => eval_input(&mut stdout, &mut state)?,

                Command::Plot => plot_input(&mut stdout, &state)?,

                Command::SetWin => set_win(&mut stdout, &mut state)?,

                Command::Precision => {
                    match shell::read_fromstr::<_, u32>(
                        &mut stdout,
                        format_args!("?precision (is {}) = ", state.ctx.precision),
                    )? {
                        Ok(Some(new)) if new > format::MAX_PRECISION => writeln!(
                            stdout,
                            "note: precision is at most {}",
                            format::MAX_PRECISION
                        )?,
                        Ok(Some(new)) => state.ctx.precision = new,
                        Ok(None) | Err(_) => {}
                    }
                }

                Command::Angle => {
                    state.ctx.angle_mode = state.ctx.angle_mode.toggled();
                    writeln!(stdout, "angles are now in {}", state.ctx.angle_mode)?;
                }

                Command::PrintTree => match compile(state.buffer.text()) {
                    Ok(tree) => shell::dump_tree(&mut stdout, &tree, format_args!("tree"))?,
                    Err(err) => shell::report(&mut stdout, &Error::Syntax(err))?,
                },
            }
        } else if let Ok(mode) = try_cmd.parse::<AngleMode>() {
            state.ctx.angle_mode = mode;
            writeln!(stdout, "angles are now in {mode}")?;
        } else {
            writeln!(stdout, r#"Unknown command, try "help" for help"#)?;
        }

        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn wrap<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let Some(fun) = shell::input(&mut out, "function: ")? else {
        return Ok(());
    };
    if fun.is_empty() {
        return Ok(());
    }
    state.buffer.wrap(&fun);
    Ok(())
}

fn eval_input<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let text = state.buffer.text().to_string();
    match state.buffer.equals(&state.ctx) {
        Ok(result) => writeln!(out, "= {result}")?,
        Err(err) => {
            shell::report(&mut out, &err)?;
            writeln!(out, "= {}", err.display_str())?;
            shell::log(stderr(), Level::Error, format_args!("'{text}': {err}"))?;
        }
    }
    Ok(())
}

fn set_win<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    writeln!(out, "win = {:#}", state.win)?;
    writeln!(out)?;
    writeln!(out, "note: leave blank to skip")?;

    for (name, dst) in [
        ("x min", &mut state.win.x.start),
        ("x max", &mut state.win.x.end),
    ] {
        match shell::read_fromstr::<_, Number>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    writeln!(out, "note: density must be a nonzero integer")?;
    for (name, dst) in [("density", &mut state.win.density)] {
        match shell::read_fromstr::<_, NonZeroU16>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    Ok(())
}

fn plot_input<W: Write>(mut out: W, state: &State) -> anyhow::Result<()> {
    let text = state.buffer.text();
    let tree = match compile(text) {
        Ok(tree) => tree,
        Err(err) => {
            let err = Error::Syntax(err);
            shell::report(&mut out, &err)?;
            shell::log(stderr(), Level::Error, format_args!("'{text}': {err}"))?;
            return Ok(());
        }
    };
    if !tree.has_variable() {
        writeln!(out, "note: expression does not depend on '{X}'")?;
    }

    let samples = sample::sample(&tree, state.win.points(), &state.ctx);
    let defined = samples.iter().filter(|p| p.y.is_some()).count();

    let written = create_data_file()
        .context("failed to open output data file")
        .and_then(|(path, file)| write_data(file, &samples).map(|()| path));
    let data_path = match written {
        Ok(path) => path,
        Err(err) => {
            writeln!(out, "error: {err:#}")?;
            shell::log(stderr(), Level::Error, format_args!("'{text}': {err:#}"))?;
            return Ok(());
        }
    };

    writeln!(
        out,
        "sampled y = {text} at {total} points over [{min}, {max}]: {defined} defined, {undefined} undefined",
        total = samples.len(),
        min = state.win.x.start,
        max = state.win.x.end,
        undefined = samples.len() - defined,
    )?;
    writeln!(out, "wrote {data_path}")?;
    shell::log(
        stderr(),
        Level::Info,
        format_args!("wrote {} points of '{text}' to {data_path}", defined),
    )?;

    Ok(())
}
