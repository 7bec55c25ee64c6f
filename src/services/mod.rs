// markshelf services
// Services talk to the outside world on behalf of the store: fetching pages to refresh titles.

pub mod page_title;
pub mod refresh_worker;
