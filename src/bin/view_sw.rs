//! CLI front-end: loads a WAD level and drives a `minifb` window around the
//! software renderer. Input handling follows the teacher's per-tic
//! `InputCmd`-gathering style (`sim::player_input` in the prior revision),
//! simplified to the arrow-key yaw/walk surface spec.md §6 calls for — no
//! ECS, no `sim` tic loop, since the spec scopes out mobjs/AI/physics.

use std::time::{Duration, Instant};

use clap::Parser;
use minifb::{Key, Window, WindowOptions};

use bsp_view::config::{Args, RenderConfig};
use bsp_view::render::{self, Renderer};
use bsp_view::span::Viewer;
use bsp_view::wad::loader::load_level;
use bsp_view::wad::raw::Wad;
use bsp_view::world::{Camera, TextureBank};

const PLAYER_HEIGHT: f32 = 41.0;
const WALK_UNITS_PER_SEC: f32 = 300.0;
const TURN_RADIANS_PER_SEC: f32 = 2.2;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let cfg = RenderConfig::from(&args);

    let wad = Wad::from_file(&args.wad_path)?;
    let marker = pick_level(&wad, args.level.as_deref())?;

    let mut bank = TextureBank::default_with_checker();
    let level = load_level(&wad, marker, &mut bank)?;
    log::info!("loaded level {}", level.name);

    let player_thing = level
        .things
        .iter()
        .find(|t| t.type_id == 1)
        .ok_or_else(|| anyhow::anyhow!("no player 1 start in {}", level.name))?;

    let mut camera = Camera::new(
        player_thing.pos.extend(PLAYER_HEIGHT),
        player_thing.angle,
        cfg.fov,
    );

    let mut renderer = Renderer::new(cfg);
    let mut win = Window::new(
        &format!("{} — {}", level.name, args.wad_path.display()),
        cfg.res_w,
        cfg.res_h,
        WindowOptions::default(),
    )?;
    win.set_target_fps(60);

    let mut framebuffer = vec![0u32; cfg.res_w * cfg.res_h];

    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();
    let mut last_tic = Instant::now();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let frame_start = Instant::now();
        let dt = last_tic.elapsed().as_secs_f32();
        last_tic = Instant::now();

        let mut forward = 0.0_f32;
        let mut strafe = 0.0_f32;
        let mut turn = 0.0_f32;

        if win.is_key_down(Key::Up) || win.is_key_down(Key::W) {
            forward += 1.0;
        }
        if win.is_key_down(Key::Down) || win.is_key_down(Key::S) {
            forward -= 1.0;
        }
        if win.is_key_down(Key::Left) {
            turn += 1.0;
        }
        if win.is_key_down(Key::Right) {
            turn -= 1.0;
        }
        if win.is_key_down(Key::A) {
            strafe -= 1.0;
        }
        if win.is_key_down(Key::D) {
            strafe += 1.0;
        }

        camera.turn(turn * TURN_RADIANS_PER_SEC * dt);
        camera.step(
            forward * WALK_UNITS_PER_SEC * dt,
            strafe * WALK_UNITS_PER_SEC * dt,
        );

        let sector = render::sector_search(&level, camera.xy());
        let floor_h = level.sectors[sector as usize].floor_h;
        let viewer = Viewer {
            pos: camera.xy(),
            yaw: camera.yaw(),
            eye_height: floor_h + camera.pos().z,
        };

        let columns = renderer.render(&level, &bank, &viewer)?;

        framebuffer.iter_mut().for_each(|p| *p = 0);
        for col in &columns {
            blit_column(&mut framebuffer, cfg.res_w, cfg.res_h, col);
        }
        win.update_with_buffer(&framebuffer, cfg.res_w, cfg.res_h)?;

        acc_time += frame_start.elapsed();
        acc_frames += 1;
        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames as f64;
            log::info!("avg render: {avg_ms:.2} ms ({:.1} FPS)", 1000.0 / avg_ms);
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }

    Ok(())
}

fn blit_column(
    framebuffer: &mut [u32],
    res_w: usize,
    res_h: usize,
    col: &bsp_view::raster::DrawnColumn,
) {
    if col.x < 0 || col.x as usize >= res_w {
        return;
    }
    let x = col.x as usize;
    for (row, &pixel) in col.pixels.iter().enumerate() {
        let y = col.y + row as i32;
        if y < 0 || y as usize >= res_h {
            continue;
        }
        framebuffer[y as usize * res_w + x] = pixel;
    }
}

/// Resolve the marker lump index for `name`, or the WAD's first map when
/// `name` is `None`.
fn pick_level(wad: &Wad, name: Option<&str>) -> anyhow::Result<usize> {
    let indices = wad.level_indices();
    match name {
        Some(name) => indices
            .into_iter()
            .find(|&idx| Wad::lump_name_str(&wad.lumps()[idx].name).eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow::anyhow!("level `{name}` not found in WAD")),
        None => indices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("WAD contains no maps")),
    }
}
