use rocket::fairing::AdHoc;

pub mod account;
pub mod keys;
pub mod rewards;

pub fn mount() -> AdHoc {
    AdHoc::on_ignite("Attaching Routes", |rocket| async {
        rocket.mount(
            "/",
            routes![
                rewards::open_next,
                rewards::open_position,
                rewards::mine,
                rewards::by_position,
                rewards::available,
                rewards::stats,
                keys::balance,
                account::profile,
                account::status,
                account::nfts,
                account::socials,
                account::link,
                account::check_handle
            ],
        )
    })
}
