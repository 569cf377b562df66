use std::{env, process};

use syncthing_launcher::{SystemSpawner, launch};

fn main() {
    let status = launch(env::args_os(), &mut SystemSpawner);

    process::exit(status)
}
